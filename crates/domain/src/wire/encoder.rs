use super::{HEADER_LEN, MAX_LABEL_LEN, MAX_NAME_LEN, MAX_POINTER_OFFSET, POINTER_MASK};
use crate::dns_message::Message;
use crate::dns_query::DnsQuery;
use crate::dns_record::{Record, RecordData, RecordType};
use crate::errors::DomainError;
use std::collections::HashMap;

/// Serializes `message`. Section counts are taken from the section lengths.
pub fn encode(message: &Message) -> Result<Vec<u8>, DomainError> {
    let mut encoder = Encoder::new();
    encoder.write_message(message)?;
    Ok(encoder.buf)
}

/// Serializes `message` with the 2-byte length prefix used on stream
/// transports (RFC 1035 §4.2.2).
pub fn encode_with_length_prefix(message: &Message) -> Result<Vec<u8>, DomainError> {
    let mut encoder = Encoder::new();
    encoder.buf.extend_from_slice(&[0, 0]);
    encoder.base = 2;
    encoder.write_message(message)?;

    let len = u16::try_from(encoder.buf.len() - 2).map_err(|_| {
        DomainError::MalformedMessage(format!(
            "message of {} bytes does not fit a stream frame",
            encoder.buf.len() - 2
        ))
    })?;
    encoder.buf[..2].copy_from_slice(&len.to_be_bytes());
    Ok(encoder.buf)
}

struct Encoder {
    buf: Vec<u8>,
    /// Offset of the message start inside `buf`; compression offsets are
    /// relative to it.
    base: usize,
    /// Name suffix -> offset where it was first written.
    labels: HashMap<String, u16>,
}

fn count(len: usize, section: &str) -> Result<u16, DomainError> {
    u16::try_from(len).map_err(|_| {
        DomainError::MalformedMessage(format!("too many {} entries: {}", section, len))
    })
}

impl Encoder {
    fn new() -> Self {
        Self {
            buf: Vec::with_capacity(512),
            base: 0,
            labels: HashMap::new(),
        }
    }

    fn offset(&self) -> usize {
        self.buf.len() - self.base
    }

    fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn write_message(&mut self, message: &Message) -> Result<(), DomainError> {
        let header = &message.header;
        self.write_u16(header.id);
        self.write_u16(header.flags());
        self.write_u16(count(message.questions.len(), "question")?);
        self.write_u16(count(message.answers.len(), "answer")?);
        self.write_u16(count(message.authority.len(), "authority")?);
        self.write_u16(count(message.additional.len(), "additional")?);
        debug_assert_eq!(self.offset(), HEADER_LEN);

        for question in &message.questions {
            self.write_question(question)?;
        }
        for record in message
            .answers
            .iter()
            .chain(&message.authority)
            .chain(&message.additional)
        {
            self.write_record(record)?;
        }
        Ok(())
    }

    fn write_question(&mut self, question: &DnsQuery) -> Result<(), DomainError> {
        self.write_name(&question.name, true)?;
        self.write_u16(question.record_type.to_u16());
        self.write_u16(question.class.to_u16());
        Ok(())
    }

    fn write_record(&mut self, record: &Record) -> Result<(), DomainError> {
        check_shape(record)?;

        self.write_name(&record.name, true)?;
        self.write_u16(record.record_type.to_u16());
        self.write_u16(record.class.to_u16());
        self.write_u32(record.ttl);

        let rdlength_at = self.buf.len();
        self.write_u16(0);
        self.write_rdata(&record.data)?;

        let rdlength = u16::try_from(self.buf.len() - rdlength_at - 2).map_err(|_| {
            DomainError::InvalidRecordData(format!("rdata of '{}' exceeds 65535 bytes", record.name))
        })?;
        self.buf[rdlength_at..rdlength_at + 2].copy_from_slice(&rdlength.to_be_bytes());
        Ok(())
    }

    fn write_rdata(&mut self, data: &RecordData) -> Result<(), DomainError> {
        match data {
            RecordData::A(ip) => self.buf.extend_from_slice(&ip.octets()),
            RecordData::Aaaa(ip) => self.buf.extend_from_slice(&ip.octets()),
            RecordData::Cname(name) | RecordData::Ns(name) | RecordData::Ptr(name) => {
                self.write_name(name, true)?
            }
            RecordData::Txt(strings) => {
                for s in strings {
                    let len = u8::try_from(s.len()).map_err(|_| {
                        DomainError::InvalidRecordData(format!(
                            "TXT character-string of {} bytes exceeds 255",
                            s.len()
                        ))
                    })?;
                    self.buf.push(len);
                    self.buf.extend_from_slice(s);
                }
            }
            RecordData::Mx { priority, target } => {
                self.write_u16(*priority);
                self.write_name(target, true)?;
            }
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => {
                self.write_u16(*priority);
                self.write_u16(*weight);
                self.write_u16(*port);
                // RFC 2782: the target is never compressed
                self.write_name(target, false)?;
            }
            RecordData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                self.write_name(mname, true)?;
                self.write_name(rname, true)?;
                for value in [serial, refresh, retry, expire, minimum] {
                    self.write_u32(*value);
                }
            }
            RecordData::Unknown(bytes) => self.buf.extend_from_slice(bytes),
        }
        Ok(())
    }

    /// Writes `name`, replacing its longest already-written suffix with a
    /// pointer when `compress` is set. Every suffix written out in full is
    /// registered for later names.
    fn write_name(&mut self, name: &str, compress: bool) -> Result<(), DomainError> {
        let name = name.strip_suffix('.').unwrap_or(name);
        if name.is_empty() {
            self.buf.push(0);
            return Ok(());
        }

        validate_name(name)?;

        let mut start = 0;
        for label in name.split('.') {
            let suffix = &name[start..];
            if compress {
                if let Some(&offset) = self.labels.get(suffix) {
                    self.write_u16(u16::from(POINTER_MASK) << 8 | offset);
                    return Ok(());
                }
            }

            let offset = self.offset();
            if offset <= MAX_POINTER_OFFSET {
                self.labels
                    .entry(suffix.to_string())
                    .or_insert(offset as u16);
            }

            self.buf.push(label.len() as u8);
            self.buf.extend_from_slice(label.as_bytes());
            start += label.len() + 1;
        }
        self.buf.push(0);
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    let mut wire_len = 1;
    for label in name.split('.') {
        if label.is_empty() {
            return Err(DomainError::InvalidDomainName(format!(
                "empty label in '{}'",
                name
            )));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(DomainError::InvalidDomainName(format!(
                "label '{}' is longer than {} bytes",
                label, MAX_LABEL_LEN
            )));
        }
        if !label.is_ascii() {
            return Err(DomainError::InvalidDomainName(format!(
                "label '{}' is not ASCII",
                label
            )));
        }
        wire_len += label.len() + 1;
    }
    if wire_len > MAX_NAME_LEN {
        return Err(DomainError::InvalidDomainName(format!(
            "'{}' is longer than {} bytes",
            name, MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// The decoder picks the rdata layout from the record type, so the data
/// shape has to agree with it.
fn check_shape(record: &Record) -> Result<(), DomainError> {
    let consistent = match record.data.natural_type() {
        Some(natural) => natural == record.record_type,
        None => matches!(record.record_type, RecordType::Unknown(_) | RecordType::ANY),
    };
    if consistent {
        Ok(())
    } else {
        Err(DomainError::InvalidRecordData(format!(
            "{} record '{}' cannot carry {:?}",
            record.record_type, record.name, record.data
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns_record::RecordClass;

    #[test]
    fn test_root_name_is_single_zero_byte() {
        let mut encoder = Encoder::new();
        encoder.write_name("", true).unwrap();
        encoder.write_name(".", true).unwrap();
        assert_eq!(encoder.buf, vec![0, 0]);
    }

    #[test]
    fn test_trailing_dot_is_ignored() {
        let mut a = Encoder::new();
        a.write_name("igor.io.", true).unwrap();
        let mut b = Encoder::new();
        b.write_name("igor.io", true).unwrap();
        assert_eq!(a.buf, b.buf);
    }

    #[test]
    fn test_suffix_is_replaced_by_pointer() {
        let mut encoder = Encoder::new();
        encoder.buf.resize(12, 0);
        encoder.write_name("igor.io", true).unwrap();
        encoder.write_name("www.igor.io", true).unwrap();
        assert_eq!(
            &encoder.buf[12..],
            &[4, b'i', b'g', b'o', b'r', 2, b'i', b'o', 0, 3, b'w', b'w', b'w', 0xC0, 12]
        );
    }

    #[test]
    fn test_uncompressed_name_still_registers_suffixes() {
        let mut encoder = Encoder::new();
        encoder.buf.resize(12, 0);
        encoder.write_name("sip.example", false).unwrap();
        encoder.write_name("example", true).unwrap();
        assert_eq!(&encoder.buf[encoder.buf.len() - 2..], &[0xC0, 16]);
    }

    #[test]
    fn test_invalid_names() {
        let mut encoder = Encoder::new();
        assert!(encoder.write_name("a..b", true).is_err());
        assert!(encoder.write_name(&"x".repeat(64), true).is_err());
        let long = vec!["abcdefghi"; 30].join(".");
        assert!(matches!(
            encoder.write_name(&long, true),
            Err(DomainError::InvalidDomainName(_))
        ));
    }

    #[test]
    fn test_shape_mismatch_fails() {
        let record = Record::new(
            "igor.io",
            RecordType::A,
            RecordClass::IN,
            60,
            RecordData::Cname("x.io".into()),
        );
        let mut encoder = Encoder::new();
        assert!(matches!(
            encoder.write_record(&record),
            Err(DomainError::InvalidRecordData(_))
        ));
    }

    #[test]
    fn test_oversized_txt_string_fails() {
        let record = Record::in_class("t.io", 60, RecordData::Txt(vec![vec![b'a'; 256]]));
        let mut encoder = Encoder::new();
        assert!(encoder.write_record(&record).is_err());
    }
}
