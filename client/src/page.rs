//! Page seams consumed by the client flows.
//!
//! DESIGN
//! ======
//! Each surface a flow reads or writes is an explicit reference handed to
//! it: the status line, the navigator, the message log, and the form values.
//! Methods take `&self` so one page can be shared by overlapping flows; the
//! last write to the status line wins.

use std::path::Path;

/// The single shared status text area.
pub trait StatusLine: Send + Sync {
    /// Replace the status text.
    fn set_status(&self, text: &str);
}

/// Where a finished submission sends the user.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Container that chat frames are appended to, one entry per frame.
pub trait MessageLog: Send {
    fn append(&mut self, message: &str);
}

/// One selected file.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), content_type: content_type.into(), bytes }
    }

    /// Read a file from disk, inferring its content type from the extension.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_owned();
        let content_type = content_type_for(path).to_owned();
        Ok(Self { name, content_type, bytes })
    }
}

/// Map a file extension to an image MIME type.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Values of the post form at the moment of submission.
#[derive(Debug, Clone)]
pub struct PostForm {
    pub file: FileUpload,
    pub topic: String,
    pub text: String,
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Mutex;

    use super::*;

    /// Records every status write and navigation for assertions.
    #[derive(Default)]
    pub struct RecordingPage {
        pub statuses: Mutex<Vec<String>>,
        pub navigations: Mutex<Vec<String>>,
    }

    impl RecordingPage {
        pub fn statuses(&self) -> Vec<String> {
            self.statuses.lock().expect("status mutex should lock").clone()
        }

        pub fn last_status(&self) -> Option<String> {
            self.statuses().last().cloned()
        }

        pub fn navigations(&self) -> Vec<String> {
            self.navigations.lock().expect("navigation mutex should lock").clone()
        }
    }

    impl StatusLine for RecordingPage {
        fn set_status(&self, text: &str) {
            self.statuses.lock().expect("status mutex should lock").push(text.to_owned());
        }
    }

    impl Navigator for RecordingPage {
        fn navigate(&self, path: &str) {
            self.navigations.lock().expect("navigation mutex should lock").push(path.to_owned());
        }
    }

    impl MessageLog for Vec<String> {
        fn append(&mut self, message: &str) {
            self.push(message.to_owned());
        }
    }

    #[must_use]
    pub fn sample_form() -> PostForm {
        PostForm {
            file: FileUpload::new("cat.png", "image/png", vec![0x89, b'P', b'N', b'G']),
            topic: "cats".into(),
            text: "look at him".into(),
        }
    }
}

#[cfg(test)]
#[path = "page_test.rs"]
mod tests;
