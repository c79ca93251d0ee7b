mod uploads;

pub use uploads::{UploadPhotoCommand, UploadService};
