use super::RecordType;
use crate::errors::DomainError;
use std::fmt::{self, Write as _};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Type-specific payload of a resource record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(String),
    Ns(String),
    Ptr(String),
    Txt(Vec<Vec<u8>>),
    Mx {
        priority: u16,
        target: String,
    },
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    /// Raw rdata of a type without a dedicated shape.
    Unknown(Vec<u8>),
}

impl RecordData {
    /// The record type this payload shape belongs to, when it is fixed.
    pub fn natural_type(&self) -> Option<RecordType> {
        match self {
            RecordData::A(_) => Some(RecordType::A),
            RecordData::Aaaa(_) => Some(RecordType::AAAA),
            RecordData::Cname(_) => Some(RecordType::CNAME),
            RecordData::Ns(_) => Some(RecordType::NS),
            RecordData::Ptr(_) => Some(RecordType::PTR),
            RecordData::Txt(_) => Some(RecordType::TXT),
            RecordData::Mx { .. } => Some(RecordType::MX),
            RecordData::Srv { .. } => Some(RecordType::SRV),
            RecordData::Soa { .. } => Some(RecordType::SOA),
            RecordData::Unknown(_) => None,
        }
    }

    pub fn priority(&self) -> Option<u16> {
        match self {
            RecordData::Mx { priority, .. } | RecordData::Srv { priority, .. } => Some(*priority),
            _ => None,
        }
    }

    /// Target name for alias-like records (CNAME, NS, PTR).
    pub fn as_name(&self) -> Option<&str> {
        match self {
            RecordData::Cname(name) | RecordData::Ns(name) | RecordData::Ptr(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<std::net::IpAddr> {
        match self {
            RecordData::A(ip) => Some((*ip).into()),
            RecordData::Aaaa(ip) => Some((*ip).into()),
            _ => None,
        }
    }

    /// Parses the zone-file presentation form of `record_type`'s rdata.
    pub fn from_presentation(record_type: RecordType, text: &str) -> Result<Self, DomainError> {
        let invalid = |reason: &str| {
            DomainError::InvalidRecordData(format!("{} '{}': {}", record_type, text, reason))
        };
        let trimmed = text.trim();

        match record_type {
            RecordType::A => trimmed
                .parse()
                .map(RecordData::A)
                .map_err(|_| invalid("not an IPv4 address")),
            RecordType::AAAA => trimmed
                .parse()
                .map(RecordData::Aaaa)
                .map_err(|_| invalid("not an IPv6 address")),
            RecordType::CNAME => Ok(RecordData::Cname(presentation_name(trimmed))),
            RecordType::NS => Ok(RecordData::Ns(presentation_name(trimmed))),
            RecordType::PTR => Ok(RecordData::Ptr(presentation_name(trimmed))),
            RecordType::TXT => tokenize_character_strings(trimmed)
                .map(RecordData::Txt)
                .ok_or_else(|| invalid("unterminated quoted string")),
            RecordType::MX => {
                let tokens: Vec<&str> = trimmed.split_whitespace().collect();
                let [priority, target] = tokens[..] else {
                    return Err(invalid("expected <priority> <target>"));
                };
                Ok(RecordData::Mx {
                    priority: priority.parse().map_err(|_| invalid("bad priority"))?,
                    target: presentation_name(target),
                })
            }
            RecordType::SRV => {
                let tokens: Vec<&str> = trimmed.split_whitespace().collect();
                let [priority, weight, port, target] = tokens[..] else {
                    return Err(invalid("expected <priority> <weight> <port> <target>"));
                };
                Ok(RecordData::Srv {
                    priority: priority.parse().map_err(|_| invalid("bad priority"))?,
                    weight: weight.parse().map_err(|_| invalid("bad weight"))?,
                    port: port.parse().map_err(|_| invalid("bad port"))?,
                    target: presentation_name(target),
                })
            }
            RecordType::SOA => {
                let tokens: Vec<&str> = trimmed.split_whitespace().collect();
                let [mname, rname, serial, refresh, retry, expire, minimum] = tokens[..] else {
                    return Err(invalid("expected exactly 7 fields"));
                };
                let number = |field: &str| field.parse::<u32>().map_err(|_| invalid("bad number"));
                Ok(RecordData::Soa {
                    mname: presentation_name(mname),
                    rname: presentation_name(rname),
                    serial: number(serial)?,
                    refresh: number(refresh)?,
                    retry: number(retry)?,
                    expire: number(expire)?,
                    minimum: number(minimum)?,
                })
            }
            RecordType::ANY | RecordType::Unknown(_) => {
                parse_generic_rdata(trimmed).ok_or_else(|| invalid("expected \\# <len> <hex>"))
            }
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::A(ip) => write!(f, "{}", ip),
            RecordData::Aaaa(ip) => write!(f, "{}", ip),
            RecordData::Cname(name) | RecordData::Ns(name) | RecordData::Ptr(name) => {
                f.write_str(name)
            }
            RecordData::Txt(strings) => {
                for (i, s) in strings.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write_character_string(f, s)?;
                }
                Ok(())
            }
            RecordData::Mx { priority, target } => write!(f, "{} {}", priority, target),
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{} {} {} {}", priority, weight, port, target),
            RecordData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => write!(
                f,
                "{} {} {} {} {} {} {}",
                mname, rname, serial, refresh, retry, expire, minimum
            ),
            RecordData::Unknown(bytes) => {
                write!(f, "\\# {}", bytes.len())?;
                if !bytes.is_empty() {
                    f.write_char(' ')?;
                    for b in bytes {
                        write!(f, "{:02x}", b)?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn presentation_name(token: &str) -> String {
    token.strip_suffix('.').unwrap_or(token).to_string()
}

fn write_character_string(f: &mut fmt::Formatter<'_>, s: &[u8]) -> fmt::Result {
    f.write_char('"')?;
    for &b in s {
        match b {
            b'"' | b'\\' => {
                f.write_char('\\')?;
                f.write_char(b as char)?;
            }
            0x20..=0x7e => f.write_char(b as char)?,
            _ => write!(f, "\\{:03}", b)?,
        }
    }
    f.write_char('"')
}

/// Splits TXT presentation text into character-strings. Quoted strings may
/// contain spaces and `\"`, `\\` or `\DDD` escapes; bare words stand alone.
fn tokenize_character_strings(text: &str) -> Option<Vec<Vec<u8>>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let quoted = bytes[i] == b'"';
        if quoted {
            i += 1;
        }
        let mut current = Vec::new();
        let mut closed = !quoted;
        while i < bytes.len() {
            let b = bytes[i];
            if quoted && b == b'"' {
                i += 1;
                closed = true;
                break;
            }
            if !quoted && b.is_ascii_whitespace() {
                break;
            }
            if b == b'\\' && i + 1 < bytes.len() {
                let digits = &bytes[i + 1..bytes.len().min(i + 4)];
                if digits.len() == 3 && digits.iter().all(u8::is_ascii_digit) {
                    let value = (digits[0] - b'0') as u16 * 100
                        + (digits[1] - b'0') as u16 * 10
                        + (digits[2] - b'0') as u16;
                    current.push(u8::try_from(value).ok()?);
                    i += 4;
                } else {
                    current.push(bytes[i + 1]);
                    i += 2;
                }
                continue;
            }
            current.push(b);
            i += 1;
        }
        if !closed {
            return None;
        }
        out.push(current);
    }

    Some(out)
}

fn parse_generic_rdata(text: &str) -> Option<RecordData> {
    let mut tokens = text.split_whitespace();
    if tokens.next()? != "\\#" {
        return None;
    }
    let len: usize = tokens.next()?.parse().ok()?;
    let hex: String = tokens.collect();
    if hex.len() != len * 2 {
        return None;
    }
    let bytes = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    Some(RecordData::Unknown(bytes))
}
