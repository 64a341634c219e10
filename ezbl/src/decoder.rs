//! The handshake state machine.
//!
//! Every data byte is fed in one at a time. A byte can be enough to finish a
//! state and start the next one (the first byte of a handshake moves us out of
//! `Idle` and is then collected as part of the sync header) but finishing a
//! field never eats an extra byte; the next state just waits for the next one.
//!
//! Nothing here can fail. Bytes from the wrong side are flagged and dropped,
//! and a bad header throws the whole handshake away so we can pick up the
//! next sync header cleanly.

use log::{debug, error, warn};

use crate::{
    annotation::{Annotation, AnnotationSink, Channel, Message},
    event::{DirectedByte, Direction, Sample, UartPacket},
    field::{Field, FieldBuffer, FieldValue},
};

/// Upper bound on state changes driven by one byte. There are eight states so
/// a byte that goes round more than this is a bug.
pub const MAX_TRANSITIONS_PER_BYTE: usize = 8;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum State {
    /// Waiting for the host to start offering a firmware image.
    #[default]
    Idle,
    AwaitSync,
    AwaitFileId,
    AwaitFileLen,
    AwaitBootIdHash,
    AwaitAppVersion,
    AwaitHmac,
    /// The handshake is done and the device should reply with a control code.
    AwaitDeviceResponse,
}

impl State {
    /// The field being collected in this state.
    pub fn expected_field(self) -> Option<Field> {
        match self {
            State::Idle => None,
            State::AwaitSync => Some(Field::Sync),
            State::AwaitFileId => Some(Field::FileId),
            State::AwaitFileLen => Some(Field::FileLen),
            State::AwaitBootIdHash => Some(Field::BootIdHash),
            State::AwaitAppVersion => Some(Field::AppVersion),
            State::AwaitHmac => Some(Field::Hmac),
            State::AwaitDeviceResponse => Some(Field::ControlCode),
        }
    }

    pub fn expected_direction(self) -> Direction {
        self.expected_field()
            .map(Field::direction)
            .unwrap_or(Direction::Initiator)
    }

    fn next(self) -> State {
        match self {
            State::Idle => State::AwaitSync,
            State::AwaitSync => State::AwaitFileId,
            State::AwaitFileId => State::AwaitFileLen,
            State::AwaitFileLen => State::AwaitBootIdHash,
            State::AwaitBootIdHash => State::AwaitAppVersion,
            State::AwaitAppVersion => State::AwaitHmac,
            State::AwaitHmac => State::AwaitDeviceResponse,
            State::AwaitDeviceResponse => State::Idle,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Options {
    /// By default the UART TX line is the host. Set this if the capture has
    /// them the other way round.
    pub swap_directions: bool,
}

enum Flow {
    /// Run the state machine again with the same byte.
    Continue,
    /// Done with this byte.
    Yield,
}

/// One handshake session. Use a separate decoder for each bus.
#[derive(Clone, Debug)]
pub struct Decoder {
    options: Options,
    state: State,
    buffer: FieldBuffer,
    handshake_start: Option<Sample>,
    file_length: Option<u32>,
    handshake_end: Option<Sample>,
    control_code: Option<u16>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Decoder {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            state: State::Idle,
            buffer: FieldBuffer::new(Field::Sync),
            handshake_start: None,
            file_length: None,
            handshake_end: None,
            control_code: None,
        }
    }

    /// Forget any partial handshake and go back to `Idle`.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.buffer.open(Field::Sync);
        self.handshake_start = None;
        self.file_length = None;
        self.handshake_end = None;
        self.control_code = None;
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Bytes collected so far for the current field.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Where the first sync byte of the current handshake started.
    pub fn handshake_start(&self) -> Option<Sample> {
        self.handshake_start
    }

    /// Set once the file length field has been decoded.
    pub fn file_length(&self) -> Option<u32> {
        self.file_length
    }

    /// End of the last HMAC byte, once the host has finished the handshake.
    pub fn handshake_end(&self) -> Option<Sample> {
        self.handshake_end
    }

    /// The code the device replied with. Nothing is done with it beyond
    /// decoding it; the firmware transfer that follows isn't decoded.
    pub fn control_code(&self) -> Option<u16> {
        self.control_code
    }

    /// Feed in a packet from the UART decoder. Anything that isn't a data
    /// byte is ignored.
    pub fn decode(&mut self, packet: &UartPacket, sink: &mut impl AnnotationSink) {
        if let Some(byte) = DirectedByte::from_packet(packet, self.options.swap_directions) {
            self.decode_byte(byte, sink);
        }
    }

    pub fn decode_byte(&mut self, byte: DirectedByte, sink: &mut impl AnnotationSink) {
        for _ in 0..MAX_TRANSITIONS_PER_BYTE {
            if let Flow::Yield = self.step(&byte, sink) {
                return;
            }
        }
        error!(
            "Byte at {} still not handled after {} transitions (state {:?}); resetting",
            byte.start, MAX_TRANSITIONS_PER_BYTE, self.state
        );
        self.reset();
    }

    fn step(&mut self, byte: &DirectedByte, sink: &mut impl AnnotationSink) -> Flow {
        if byte.direction != self.state.expected_direction() {
            let message = match byte.direction {
                Direction::Responder => Message::UnexpectedResponder,
                Direction::Initiator => Message::UnexpectedInitiator,
            };
            emit(sink, message.annotate(byte.start, byte.end));
            return Flow::Yield;
        }

        if self.state == State::Idle {
            // The host has started a new handshake.
            self.reset();
            self.handshake_start = Some(byte.start);
            self.advance();
            return Flow::Continue;
        }

        let Some(completed) = self.buffer.push(byte.value, byte.start) else {
            return Flow::Yield;
        };
        let Some(value) = completed.decode() else {
            error!("Could not decode {:?} from {:?}", completed.field, completed.bytes);
            self.reset();
            return Flow::Yield;
        };

        let start = completed.start;
        let end = byte.end;
        match value {
            FieldValue::Sync { valid: false } => {
                emit(sink, Message::WrongSync.annotate(byte.start, byte.end));
                self.reset();
                return Flow::Yield;
            }
            FieldValue::Sync { valid: true } => {
                emit(sink, Message::Sync.annotate(start, end));
            }
            FieldValue::FileId { valid: false } => {
                emit(sink, Message::WrongFileId.annotate(byte.start, byte.end));
                self.reset();
                return Flow::Yield;
            }
            FieldValue::FileId { valid: true } => {
                emit(sink, Message::FileId.annotate(start, end));
            }
            FieldValue::FileLen(length) => {
                self.file_length = Some(length);
                emit(sink, Message::FileLength.annotate_with(start, end, length));
            }
            FieldValue::BootIdHash(hash) => {
                emit(sink, Message::BootIdHash.annotate_with(start, end, hash));
            }
            FieldValue::AppVersion(version) => {
                emit(sink, Message::AppVersion.annotate_with(start, end, version));
            }
            FieldValue::Hmac(hmac) => {
                emit(sink, Message::Hmac.annotate_with(start, end, hmac));
                self.handshake_end = Some(end);
            }
            FieldValue::ControlCode(code) => {
                debug!("Control code 0x{code:04x} at {start}..{end}");
                self.control_code = Some(code);
            }
        }
        self.advance();
        Flow::Yield
    }

    fn advance(&mut self) {
        let next = self.state.next();
        debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
        if let Some(field) = next.expected_field() {
            self.buffer.open(field);
        }
    }
}

fn emit(sink: &mut impl AnnotationSink, annotation: Annotation) {
    if annotation.channel == Channel::Warning {
        warn!("{}..{}: {}", annotation.start, annotation.end, annotation.label());
    } else {
        debug!("{}..{}: {}", annotation.start, annotation.end, annotation.label());
    }
    sink.put(annotation);
}
