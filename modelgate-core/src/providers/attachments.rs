//! Multi-modal attachment builder
//!
//! Turns image references into canonical messages and, for providers that
//! need inline bytes, downloads and base64-encodes them through the injected
//! [`ImageFetcher`].

use crate::http::{ImageFetcher, TransportError};
use crate::protocol::{Attachment, Message, MessageContent, Role};
use crate::providers::adapter::ImageEncoding;
use std::collections::HashMap;
use tracing::debug;

/// MIME type reported for unrecognized suffixes; still transmitted
pub const UNKNOWN_MIME_TYPE: &str = "unknown";

/// Infer an image MIME type from the reference's file-extension suffix
///
/// Query strings and fragments are ignored and matching is case-insensitive.
pub fn mime_type_for(reference: &str) -> &'static str {
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference);
    let file_name = path.rsplit('/').next().unwrap_or(path);

    let Some((_, extension)) = file_name.rsplit_once('.') else {
        return UNKNOWN_MIME_TYPE;
    };

    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => UNKNOWN_MIME_TYPE,
    }
}

/// One user message per image, followed by one trailing user message with
/// the text
pub fn image_messages<S: AsRef<str>>(image_refs: &[S], text: &str) -> Vec<Message> {
    image_refs
        .iter()
        .map(|reference| {
            Message::new(
                Role::User,
                MessageContent::Parts(vec![Attachment::image(reference.as_ref())]),
            )
        })
        .chain(std::iter::once(Message::user(text)))
        .collect()
}

/// Base64 image bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Image bytes resolved for one request, keyed by reference
#[derive(Debug, Clone, Default)]
pub struct ResolvedImages {
    inline: HashMap<String, InlineImage>,
}

impl ResolvedImages {
    /// Inline data for a reference
    ///
    /// References that were not fetched (URL-style providers, debug-prompt
    /// mode, or a failed fetch) yield a placeholder naming the reference.
    pub fn inline(&self, reference: &str) -> InlineImage {
        self.inline
            .get(reference)
            .cloned()
            .unwrap_or_else(|| InlineImage {
                mime_type: mime_type_for(reference).to_string(),
                data: unfetched_placeholder(reference),
            })
    }

    pub fn len(&self) -> usize {
        self.inline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inline.is_empty()
    }
}

fn unfetched_placeholder(reference: &str) -> String {
    format!("<image data not fetched: {}>", reference)
}

/// Fetch every image the provider needs inline, sequentially and in
/// reference order
///
/// Nothing is fetched for URL-style providers or when `simulate` is set.
/// The first fetch failure aborts resolution.
pub fn resolve_images(
    messages: &[Message],
    encoding: ImageEncoding,
    fetcher: &dyn ImageFetcher,
    simulate: bool,
) -> Result<ResolvedImages, TransportError> {
    let mut resolved = ResolvedImages::default();
    if !encoding.needs_bytes() || simulate {
        return Ok(resolved);
    }

    for message in messages {
        let MessageContent::Parts(parts) = &message.content else {
            continue;
        };
        for part in parts {
            let Attachment::Image { reference } = part else {
                continue;
            };
            if resolved.inline.contains_key(reference) {
                continue;
            }

            debug!("Fetching image {}", reference);
            let data = fetcher.fetch_base64(reference)?;
            resolved.inline.insert(
                reference.clone(),
                InlineImage {
                    mime_type: mime_type_for(reference).to_string(),
                    data,
                },
            );
        }
    }

    Ok(resolved)
}
