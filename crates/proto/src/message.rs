//! Query construction and response parsing.
//!
//! Queries are built eagerly into a wire buffer; responses are parsed
//! lazily, one section at a time, from a shared cursor. Accessing a later
//! section forces every earlier one first, which keeps the cursor correct
//! without parsing sections nobody asked for.

use crate::error::WireError;
use crate::header::{Header, HEADER_LEN};
use crate::name::{encoded_len, read_name, write_name};
use nameq_domain::RecordType;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::debug;

/// One entry of the question section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
}

/// Typed resource record payload. Address and name records are decoded;
/// everything else is kept opaque and skipped by its declared length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(String),
    Ptr(String),
    Other(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub data: RecordData,
}

/// Serializes a query message for `name`.
///
/// The header carries QDCOUNT=1 and the RD flag; the transaction ID is left
/// zero for the engine to stamp at send time.
pub fn build_query(name: &str, qtype: RecordType, qclass: u16) -> Result<Vec<u8>, WireError> {
    let mut buf = Vec::with_capacity(HEADER_LEN + encoded_len(name) + 4);
    buf.resize(HEADER_LEN, 0);
    write_name(name, &mut buf)?;
    buf.extend_from_slice(&qtype.to_u16().to_be_bytes());
    buf.extend_from_slice(&qclass.to_be_bytes());
    Header::new_query().write(&mut buf[..HEADER_LEN])?;
    Ok(buf)
}

/// A received message with lazily decoded sections.
///
/// Each section is parsed on first access and memoized; repeated access is
/// free. Parse failures surface as [`WireError`], never a panic.
#[derive(Debug)]
pub struct Response {
    bytes: Vec<u8>,
    header: Header,
    cursor: usize,
    questions: Option<Vec<Question>>,
    answers: Option<Vec<Record>>,
    authority: Option<Vec<Record>>,
    additional: Option<Vec<Record>>,
}

impl Response {
    /// Decodes the header; section contents stay untouched until accessed.
    pub fn parse(bytes: Vec<u8>) -> Result<Self, WireError> {
        let header = Header::read(&bytes)?;
        debug!(
            id = header.id,
            rcode = header.rcode(),
            qdcount = header.qdcount,
            ancount = header.ancount,
            nscount = header.nscount,
            arcount = header.arcount,
            "response header parsed"
        );
        Ok(Self {
            bytes,
            header,
            cursor: HEADER_LEN,
            questions: None,
            answers: None,
            authority: None,
            additional: None,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn questions(&mut self) -> Result<&[Question], WireError> {
        if self.questions.is_none() {
            let mut items = Vec::with_capacity(self.header.qdcount as usize);
            let mut pos = self.cursor;
            for _ in 0..self.header.qdcount {
                let (question, next) = read_question(&self.bytes, pos)?;
                items.push(question);
                pos = next;
            }
            self.cursor = pos;
            self.questions = Some(items);
        }
        Ok(self.questions.as_deref().unwrap_or_default())
    }

    pub fn answers(&mut self) -> Result<&[Record], WireError> {
        self.questions()?;
        if self.answers.is_none() {
            let (items, next) = read_records(&self.bytes, self.cursor, self.header.ancount)?;
            self.cursor = next;
            self.answers = Some(items);
        }
        Ok(self.answers.as_deref().unwrap_or_default())
    }

    pub fn authority(&mut self) -> Result<&[Record], WireError> {
        self.answers()?;
        if self.authority.is_none() {
            let (items, next) = read_records(&self.bytes, self.cursor, self.header.nscount)?;
            self.cursor = next;
            self.authority = Some(items);
        }
        Ok(self.authority.as_deref().unwrap_or_default())
    }

    pub fn additional(&mut self) -> Result<&[Record], WireError> {
        self.authority()?;
        if self.additional.is_none() {
            let (items, next) = read_records(&self.bytes, self.cursor, self.header.arcount)?;
            self.cursor = next;
            self.additional = Some(items);
        }
        Ok(self.additional.as_deref().unwrap_or_default())
    }
}

fn read_question(msg: &[u8], pos: usize) -> Result<(Question, usize), WireError> {
    let (name, pos) = read_name(msg, pos)?;
    let fixed = msg.get(pos..pos + 4).ok_or(WireError::Truncated)?;
    Ok((
        Question {
            name,
            qtype: u16::from_be_bytes([fixed[0], fixed[1]]),
            qclass: u16::from_be_bytes([fixed[2], fixed[3]]),
        },
        pos + 4,
    ))
}

fn read_records(msg: &[u8], mut pos: usize, count: u16) -> Result<(Vec<Record>, usize), WireError> {
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (record, next) = read_record(msg, pos)?;
        items.push(record);
        pos = next;
    }
    Ok((items, pos))
}

fn read_record(msg: &[u8], pos: usize) -> Result<(Record, usize), WireError> {
    let (name, pos) = read_name(msg, pos)?;
    let fixed = msg.get(pos..pos + 10).ok_or(WireError::Truncated)?;
    let rtype = u16::from_be_bytes([fixed[0], fixed[1]]);
    let class = u16::from_be_bytes([fixed[2], fixed[3]]);
    let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
    let rdlen = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;

    let rdata_at = pos + 10;
    let rdata = msg
        .get(rdata_at..rdata_at + rdlen)
        .ok_or(WireError::RdataOverrun)?;

    let data = match RecordType::from_u16(rtype) {
        Some(RecordType::A) => {
            let octets: [u8; 4] = rdata.try_into().map_err(|_| WireError::RdataOverrun)?;
            RecordData::A(Ipv4Addr::from(octets))
        }
        Some(RecordType::AAAA) => {
            let octets: [u8; 16] = rdata.try_into().map_err(|_| WireError::RdataOverrun)?;
            RecordData::Aaaa(Ipv6Addr::from(octets))
        }
        // Name-valued rdata may use compression pointers into the rest of
        // the message, so it is decoded against the whole buffer.
        Some(RecordType::CNAME) => RecordData::Cname(read_name(msg, rdata_at)?.0),
        Some(RecordType::PTR) => RecordData::Ptr(read_name(msg, rdata_at)?.0),
        _ => RecordData::Other(rdata.to_vec()),
    };

    Ok((
        Record {
            name,
            rtype,
            class,
            ttl,
            data,
        },
        rdata_at + rdlen,
    ))
}
