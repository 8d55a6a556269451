#![allow(dead_code)]
use tern_domain::{DnsQuery, Message, Record, RecordData, RecordType, ResponseCode};

pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn response(name: &str, record_type: RecordType) -> Self {
        Self {
            message: Message::response_for(DnsQuery::new(name, record_type), Vec::new()),
        }
    }

    pub fn id(mut self, id: u16) -> Self {
        self.message.header.id = id;
        self
    }

    pub fn rcode(mut self, rcode: ResponseCode) -> Self {
        self.message.header.rcode = rcode;
        self
    }

    pub fn truncated(mut self) -> Self {
        self.message.header.tc = true;
        self
    }

    pub fn answer(mut self, name: &str, ttl: u32, data: RecordData) -> Self {
        self.message.answers.push(Record::in_class(name, ttl, data));
        self
    }

    pub fn authority(mut self, name: &str, ttl: u32, data: RecordData) -> Self {
        self.message.authority.push(Record::in_class(name, ttl, data));
        self
    }

    pub fn additional(mut self, name: &str, ttl: u32, data: RecordData) -> Self {
        self.message.additional.push(Record::in_class(name, ttl, data));
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}
