use std::fmt;

/// Transient user notification raised by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    DocumentUploaded { filename: String },
    UploadFailed { detail: String },
    CapacityReached { max: usize },
    NotAPdf { filename: String },
    ThreadLoadFailed { thread_id: String },
    DeleteFailed { thread_id: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DocumentUploaded { filename } => {
                write!(f, "PDF \"{}\" uploaded successfully!", filename)
            }
            Notice::UploadFailed { detail } => write!(f, "Error uploading PDF: {}", detail),
            Notice::CapacityReached { max } => write!(
                f,
                "Maximum {} PDFs allowed. Please delete a PDF before uploading a new one.",
                max
            ),
            Notice::NotAPdf { filename } => {
                write!(f, "Please select a PDF file ({} is not one).", filename)
            }
            Notice::ThreadLoadFailed { thread_id } => {
                write!(f, "Failed to load chat {}. Started a new chat instead.", thread_id)
            }
            Notice::DeleteFailed { thread_id } => write!(
                f,
                "Could not delete chat {} on the server; removed locally.",
                thread_id
            ),
        }
    }
}
