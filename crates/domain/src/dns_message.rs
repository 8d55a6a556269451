use crate::dns_query::DnsQuery;
use crate::dns_record::Record;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Query,
    IQuery,
    Status,
    Notify,
    Update,
    Other(u8),
}

impl Opcode {
    pub fn to_u8(&self) -> u8 {
        match self {
            Opcode::Query => 0,
            Opcode::IQuery => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Other(code) => *code & 0x0f,
        }
    }

    pub fn from_u8(code: u8) -> Self {
        match code & 0x0f {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
            2 => Opcode::Status,
            4 => Opcode::Notify,
            5 => Opcode::Update,
            other => Opcode::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl ResponseCode {
    pub fn to_u8(&self) -> u8 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NxDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Other(code) => *code & 0x0f,
        }
    }

    pub fn from_u8(code: u8) -> Self {
        match code & 0x0f {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NxDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            other => ResponseCode::Other(other),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseCode::NoError)
    }

    pub fn description(&self) -> String {
        match self {
            ResponseCode::NoError => "No Error".to_string(),
            ResponseCode::FormErr => "Format Error".to_string(),
            ResponseCode::ServFail => "Server Failure".to_string(),
            ResponseCode::NxDomain => "Non-Existent Domain / NXDOMAIN".to_string(),
            ResponseCode::NotImp => "Not Implemented".to_string(),
            ResponseCode::Refused => "Refused".to_string(),
            ResponseCode::Other(code) => format!("Unknown error response code {}", code),
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// The fixed 12-byte header minus the section counts, which are always
/// derived from the section lengths when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub qr: bool,
    pub opcode: Opcode,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: u8,
    pub rcode: ResponseCode,
}

impl Header {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            qr: false,
            opcode: Opcode::Query,
            aa: false,
            tc: false,
            rd: false,
            ra: false,
            z: 0,
            rcode: ResponseCode::NoError,
        }
    }

    /// qr:1 opcode:4 aa:1 tc:1 rd:1 ra:1 z:3 rcode:4
    pub fn flags(&self) -> u16 {
        (self.qr as u16) << 15
            | (self.opcode.to_u8() as u16 & 0x0f) << 11
            | (self.aa as u16) << 10
            | (self.tc as u16) << 9
            | (self.rd as u16) << 8
            | (self.ra as u16) << 7
            | (self.z as u16 & 0x07) << 4
            | self.rcode.to_u8() as u16 & 0x0f
    }

    pub fn from_flags(id: u16, flags: u16) -> Self {
        Self {
            id,
            qr: flags & 0x8000 != 0,
            opcode: Opcode::from_u8(((flags >> 11) & 0x0f) as u8),
            aa: flags & 0x0400 != 0,
            tc: flags & 0x0200 != 0,
            rd: flags & 0x0100 != 0,
            ra: flags & 0x0080 != 0,
            z: ((flags >> 4) & 0x07) as u8,
            rcode: ResponseCode::from_u8((flags & 0x0f) as u8),
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<DnsQuery>,
    pub answers: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
}

impl Message {
    /// A recursive query for `query` with the given transaction id.
    pub fn request(id: u16, query: DnsQuery) -> Self {
        let mut header = Header::new(id);
        header.rd = true;
        Self {
            header,
            questions: vec![query],
            ..Default::default()
        }
    }

    /// A successful recursive response to `query` carrying `answers`.
    pub fn response_for(query: DnsQuery, answers: Vec<Record>) -> Self {
        let mut header = Header::new(0);
        header.qr = true;
        header.rd = true;
        header.ra = true;
        Self {
            header,
            questions: vec![query],
            answers,
            ..Default::default()
        }
    }

    pub fn id(&self) -> u16 {
        self.header.id
    }

    pub fn rcode(&self) -> ResponseCode {
        self.header.rcode
    }

    pub fn is_response(&self) -> bool {
        self.header.qr
    }

    pub fn is_truncated(&self) -> bool {
        self.header.tc
    }

    pub fn question(&self) -> Option<&DnsQuery> {
        self.questions.first()
    }

    /// Smallest TTL across the answer section.
    pub fn min_answer_ttl(&self) -> Option<u32> {
        self.answers.iter().map(|r| r.ttl).min()
    }
}
