use std::path::Path;

use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;

use crate::error::DeliveryError;
use crate::store::Recipient;

/// An attachment read into memory once per run
#[derive(Debug, Clone)]
pub struct LoadedAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

impl LoadedAttachment {
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        Ok(Self { filename, content })
    }
}

/// Whether `path` names a file we can open for reading
pub fn is_readable_file(path: &Path) -> bool {
    path.is_file() && std::fs::File::open(path).is_ok()
}

/// Build the message one recipient receives
pub fn build_message(
    from: &Mailbox,
    to: &Recipient,
    subject: &str,
    body: &str,
    attachments: &[LoadedAttachment],
) -> Result<Message, DeliveryError> {
    let builder = Message::builder()
        .from(from.clone())
        .to(Mailbox::new(None, to.address().clone()))
        .subject(subject);

    let result = if attachments.is_empty() {
        builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
    } else {
        let octet_stream = ContentType::parse("application/octet-stream")
            .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))?;
        let mut mixed = MultiPart::mixed().singlepart(SinglePart::plain(body.to_string()));
        for attachment in attachments {
            mixed = mixed.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), octet_stream.clone()),
            );
        }
        builder.multipart(mixed)
    };

    result.map_err(|e| DeliveryError::InvalidMessage(e.to_string()))
}
