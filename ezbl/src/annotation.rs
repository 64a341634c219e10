//! Annotations produced by the decoder.
//!
//! Each one covers a sample range and carries a few renderings of the same
//! text, longest first, so whatever displays them can pick one that fits.

use std::fmt::Display;

use crate::event::Sample;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Channel {
    InitiatorData = 0,
    /// Declared for completeness; nothing the device sends is annotated yet.
    ResponderData = 1,
    Warning = 2,
}

impl Channel {
    pub const ALL: [Channel; 3] = [
        Channel::InitiatorData,
        Channel::ResponderData,
        Channel::Warning,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn id(self) -> &'static str {
        match self {
            Channel::InitiatorData => "mosi-data",
            Channel::ResponderData => "miso-data",
            Channel::Warning => "warnings",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Channel::InitiatorData => "MOSI data",
            Channel::ResponderData => "MISO data",
            Channel::Warning => "Warnings",
        }
    }
}

/// Everything the decoder can say. `{}` in a template is replaced by the
/// field value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Message {
    UnexpectedResponder,
    UnexpectedInitiator,
    WrongSync,
    Sync,
    WrongFileId,
    FileId,
    FileLength,
    BootIdHash,
    AppVersion,
    Hmac,
}

impl Message {
    pub fn templates(self) -> &'static [&'static str] {
        match self {
            Message::UnexpectedResponder => &["Unexpected responder message", "Unexp. RSP", "?RSP"],
            Message::UnexpectedInitiator => &["Unexpected initiator message", "Unexp. INI", "?INI"],
            Message::WrongSync => &["Wrong synchronization header", "Wrong SYNC", "!SYNC"],
            Message::Sync => &["Synchronization header", "SYNC HDR", "SYNC"],
            Message::WrongFileId => &["Wrong file id header", "Wrong FILEID", "!FILEID"],
            Message::FileId => &["File ID header", "FILEID HDR", "FILEID"],
            Message::FileLength => &["File length: {} bytes", "FILE LEN: {}b", "LEN: {}b"],
            Message::BootIdHash => &["Boot ID hash: {}", "BOOTID: {}"],
            Message::AppVersion => &["Application version: {}", "APP VER: {}", "{}"],
            Message::Hmac => &["HMAC_SHA_256: {}", "HMAC: {}"],
        }
    }

    pub fn channel(self) -> Channel {
        match self {
            Message::UnexpectedResponder
            | Message::UnexpectedInitiator
            | Message::WrongSync
            | Message::WrongFileId => Channel::Warning,
            _ => Channel::InitiatorData,
        }
    }

    pub fn labels(self) -> Vec<String> {
        self.templates().iter().map(|t| t.to_string()).collect()
    }

    /// Substitute `value` into every variant.
    pub fn format(self, value: impl Display) -> Vec<String> {
        let value = value.to_string();
        self.templates()
            .iter()
            .map(|t| t.replace("{}", &value))
            .collect()
    }

    pub fn annotate(self, start: Sample, end: Sample) -> Annotation {
        Annotation::new(start, end, self.channel(), self.labels())
    }

    pub fn annotate_with(self, start: Sample, end: Sample, value: impl Display) -> Annotation {
        Annotation::new(start, end, self.channel(), self.format(value))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Annotation {
    pub start: Sample,
    pub end: Sample,
    pub channel: Channel,
    /// Longest first. Never empty.
    pub labels: Vec<String>,
}

impl Annotation {
    pub fn new(start: Sample, end: Sample, channel: Channel, labels: Vec<String>) -> Self {
        Self {
            start,
            end,
            channel,
            labels,
        }
    }

    /// The longest rendering.
    pub fn label(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or("")
    }

    pub fn is_warning(&self) -> bool {
        self.channel == Channel::Warning
    }
}

/// Wherever annotations end up.
pub trait AnnotationSink {
    fn put(&mut self, annotation: Annotation);
}

impl AnnotationSink for Vec<Annotation> {
    fn put(&mut self, annotation: Annotation) {
        self.push(annotation);
    }
}

impl<S: AnnotationSink + ?Sized> AnnotationSink for &mut S {
    fn put(&mut self, annotation: Annotation) {
        (**self).put(annotation);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_channel_indices() {
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
        assert_eq!(Channel::Warning.id(), "warnings");
    }

    #[test]
    fn test_format_substitutes_every_variant() {
        assert_eq!(
            Message::FileLength.format(1234),
            vec!["File length: 1234 bytes", "FILE LEN: 1234b", "LEN: 1234b"]
        );
        assert_eq!(
            Message::AppVersion.format("v1.2.5"),
            vec!["Application version: v1.2.5", "APP VER: v1.2.5", "v1.2.5"]
        );
    }

    #[test]
    fn test_annotate() {
        let annotation = Message::WrongSync.annotate(Sample(5), Sample(9));
        assert!(annotation.is_warning());
        assert_eq!(annotation.label(), "Wrong synchronization header");
        assert_eq!(annotation.labels.len(), 3);

        let annotation = Message::Hmac.annotate_with(Sample(0), Sample(1), "abcd");
        assert_eq!(annotation.channel, Channel::InitiatorData);
        assert_eq!(annotation.labels, vec!["HMAC_SHA_256: abcd", "HMAC: abcd"]);
    }

    #[test]
    fn test_sink_by_reference() {
        fn emit(mut sink: impl AnnotationSink) {
            sink.put(Message::Sync.annotate(Sample(0), Sample(160)));
        }
        let mut annotations = Vec::new();
        emit(&mut annotations);
        emit(&mut annotations);
        assert_eq!(annotations.len(), 2);
    }
}
