use super::{HEADER_LEN, MAX_NAME_LEN, POINTER_MASK};
use crate::dns_message::{Header, Message};
use crate::dns_query::DnsQuery;
use crate::dns_record::{Record, RecordClass, RecordData, RecordType};
use crate::errors::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Decodes one complete message. Bytes after the last record announced by
/// the header are ignored.
pub fn decode(bytes: &[u8]) -> Result<Message, DomainError> {
    decode_prefix(bytes).map(|(message, _)| message)
}

/// Decodes the message at the start of `bytes` and returns it together with
/// the number of bytes it occupied.
pub fn decode_prefix(bytes: &[u8]) -> Result<(Message, usize), DomainError> {
    let mut decoder = Decoder::new(bytes);
    let message = decoder.read_message()?;
    Ok((message, decoder.pos))
}

struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

fn malformed(reason: impl Into<String>) -> DomainError {
    DomainError::MalformedMessage(reason.into())
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8], DomainError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                malformed(format!(
                    "truncated {} at offset {} (need {} bytes, {} left)",
                    what,
                    self.pos,
                    len,
                    self.data.len().saturating_sub(self.pos)
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self, what: &str) -> Result<u8, DomainError> {
        Ok(self.read_bytes(1, what)?[0])
    }

    fn read_u16(&mut self, what: &str) -> Result<u16, DomainError> {
        let b = self.read_bytes(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self, what: &str) -> Result<u32, DomainError> {
        let b = self.read_bytes(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_message(&mut self) -> Result<Message, DomainError> {
        if self.data.len() < HEADER_LEN {
            return Err(malformed(format!(
                "message too short: {} bytes, header needs {}",
                self.data.len(),
                HEADER_LEN
            )));
        }

        let id = self.read_u16("header")?;
        let flags = self.read_u16("header")?;
        let qd_count = self.read_u16("header")? as usize;
        let an_count = self.read_u16("header")? as usize;
        let ns_count = self.read_u16("header")? as usize;
        let ar_count = self.read_u16("header")? as usize;

        let mut message = Message {
            header: Header::from_flags(id, flags),
            ..Default::default()
        };

        message.questions.reserve(qd_count.min(16));
        for _ in 0..qd_count {
            let question = self.read_question()?;
            message.questions.push(question);
        }
        message.answers = self.read_records(an_count)?;
        message.authority = self.read_records(ns_count)?;
        message.additional = self.read_records(ar_count)?;

        Ok(message)
    }

    fn read_records(&mut self, count: usize) -> Result<Vec<Record>, DomainError> {
        let mut records = Vec::with_capacity(count.min(32));
        for _ in 0..count {
            records.push(self.read_record()?);
        }
        Ok(records)
    }

    fn read_question(&mut self) -> Result<DnsQuery, DomainError> {
        let name = self.read_name()?;
        let record_type = RecordType::from_u16(self.read_u16("question type")?);
        let class = RecordClass::from_u16(self.read_u16("question class")?);
        Ok(DnsQuery::new(name, record_type).with_class(class))
    }

    fn read_record(&mut self) -> Result<Record, DomainError> {
        let name = self.read_name()?;
        let record_type = RecordType::from_u16(self.read_u16("record type")?);
        let class = RecordClass::from_u16(self.read_u16("record class")?);
        let raw_ttl = self.read_u32("record ttl")?;
        // TTLs with the sign bit set count as already expired
        let ttl = if raw_ttl > i32::MAX as u32 { 0 } else { raw_ttl };
        let rdlength = self.read_u16("record rdlength")? as usize;

        let rdata_start = self.pos;
        let rdata_end = rdata_start + rdlength;
        if rdata_end > self.data.len() {
            return Err(malformed(format!(
                "rdata of {} record '{}' overruns message ({} bytes declared, {} left)",
                record_type,
                name,
                rdlength,
                self.data.len() - rdata_start
            )));
        }

        let data = self.read_rdata(record_type, rdata_end)?;
        if self.pos != rdata_end {
            return Err(malformed(format!(
                "{} record '{}' rdata is {} bytes but rdlength says {}",
                record_type,
                name,
                self.pos - rdata_start,
                rdlength
            )));
        }

        Ok(Record {
            name,
            record_type,
            class,
            ttl,
            data,
        })
    }

    fn read_rdata(&mut self, record_type: RecordType, end: usize) -> Result<RecordData, DomainError> {
        let available = end - self.pos;
        let data = match record_type {
            RecordType::A => {
                if available != 4 {
                    return Err(malformed(format!("A rdata must be 4 bytes, got {}", available)));
                }
                let b = self.read_bytes(4, "A rdata")?;
                RecordData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
            }
            RecordType::AAAA => {
                if available != 16 {
                    return Err(malformed(format!(
                        "AAAA rdata must be 16 bytes, got {}",
                        available
                    )));
                }
                let mut octets = [0u8; 16];
                octets.copy_from_slice(self.read_bytes(16, "AAAA rdata")?);
                RecordData::Aaaa(Ipv6Addr::from(octets))
            }
            RecordType::CNAME => RecordData::Cname(self.read_name_within(end)?),
            RecordType::NS => RecordData::Ns(self.read_name_within(end)?),
            RecordType::PTR => RecordData::Ptr(self.read_name_within(end)?),
            RecordType::TXT => {
                let mut strings = Vec::new();
                while self.pos < end {
                    let len = self.read_u8("TXT length")? as usize;
                    if self.pos + len > end {
                        return Err(malformed(format!(
                            "TXT character-string of {} bytes overruns rdata",
                            len
                        )));
                    }
                    strings.push(self.read_bytes(len, "TXT data")?.to_vec());
                }
                RecordData::Txt(strings)
            }
            RecordType::MX => {
                let priority = self.read_u16_within(end, "MX priority")?;
                RecordData::Mx {
                    priority,
                    target: self.read_name_within(end)?,
                }
            }
            RecordType::SRV => {
                let priority = self.read_u16_within(end, "SRV priority")?;
                let weight = self.read_u16_within(end, "SRV weight")?;
                let port = self.read_u16_within(end, "SRV port")?;
                RecordData::Srv {
                    priority,
                    weight,
                    port,
                    target: self.read_name_within(end)?,
                }
            }
            RecordType::SOA => {
                let mname = self.read_name_within(end)?;
                let rname = self.read_name_within(end)?;
                if end - self.pos < 20 {
                    return Err(malformed(format!(
                        "SOA timers need 20 bytes, {} left in rdata",
                        end - self.pos
                    )));
                }
                RecordData::Soa {
                    mname,
                    rname,
                    serial: self.read_u32("SOA serial")?,
                    refresh: self.read_u32("SOA refresh")?,
                    retry: self.read_u32("SOA retry")?,
                    expire: self.read_u32("SOA expire")?,
                    minimum: self.read_u32("SOA minimum")?,
                }
            }
            RecordType::ANY | RecordType::Unknown(_) => {
                RecordData::Unknown(self.read_bytes(available, "rdata")?.to_vec())
            }
        };
        Ok(data)
    }

    fn read_u16_within(&mut self, end: usize, what: &str) -> Result<u16, DomainError> {
        if end - self.pos < 2 {
            return Err(malformed(format!("truncated {} in rdata", what)));
        }
        self.read_u16(what)
    }

    fn read_name_within(&mut self, end: usize) -> Result<String, DomainError> {
        let name = self.read_name()?;
        if self.pos > end {
            return Err(malformed(format!("name '{}' overruns rdata", name)));
        }
        Ok(name)
    }

    /// Reads a possibly compressed domain name starting at the cursor.
    ///
    /// A pointer must reference an offset strictly before its own position;
    /// since every jump moves backwards the walk cannot loop.
    fn read_name(&mut self) -> Result<String, DomainError> {
        let mut labels: Vec<String> = Vec::new();
        let mut wire_len = 0usize;
        let mut pos = self.pos;
        let mut resume_at: Option<usize> = None;

        loop {
            let len = *self
                .data
                .get(pos)
                .ok_or_else(|| malformed(format!("truncated name at offset {}", pos)))?;

            match len & POINTER_MASK {
                0x00 if len == 0 => {
                    pos += 1;
                    break;
                }
                0x00 => {
                    let start = pos + 1;
                    let stop = start + len as usize;
                    let label = self.data.get(start..stop).ok_or_else(|| {
                        malformed(format!(
                            "label of {} bytes at offset {} exceeds message",
                            len, pos
                        ))
                    })?;
                    wire_len += len as usize + 1;
                    if wire_len + 1 > MAX_NAME_LEN {
                        return Err(malformed(format!(
                            "name at offset {} longer than {} bytes",
                            self.pos, MAX_NAME_LEN
                        )));
                    }
                    // names are kept as dotted text, so a label must not
                    // hold a dot or bytes outside ASCII
                    if let Some(bad) = label.iter().find(|b| **b == b'.' || !b.is_ascii()) {
                        return Err(malformed(format!(
                            "label at offset {} contains byte 0x{:02x}",
                            pos, bad
                        )));
                    }
                    labels.push(label.iter().map(|&b| b as char).collect());
                    pos = stop;
                }
                POINTER_MASK => {
                    let low = *self.data.get(pos + 1).ok_or_else(|| {
                        malformed(format!("truncated compression pointer at offset {}", pos))
                    })?;
                    let target = ((len & !POINTER_MASK) as usize) << 8 | low as usize;
                    if target >= pos {
                        return Err(malformed(format!(
                            "compression pointer at offset {} does not point backwards (target {})",
                            pos, target
                        )));
                    }
                    resume_at.get_or_insert(pos + 2);
                    pos = target;
                }
                _ => {
                    return Err(malformed(format!(
                        "unsupported label type 0x{:02x} at offset {}",
                        len, pos
                    )));
                }
            }
        }

        self.pos = resume_at.unwrap_or(pos);
        Ok(labels.join("."))
    }
}
