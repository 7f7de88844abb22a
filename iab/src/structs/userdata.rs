//! Frame metadata payloads: authoring tool info and opaque user data.

use std::io;

use crate::structs::element::{ElementId, write_envelope};
use crate::utils::bitstream_io::{BitstreamIoReader, BitstreamIoWriter};
use crate::utils::errors::ParseError;
use crate::validate::ValidationCtx;
use crate::validate::issue::{ConstraintSet, ErrorCode, IssueId};
use crate::validate::registry;

/// NUL-terminated tool identification string, ASCII by convention.
///
/// Only the NUL terminator is enforced on parse; the payload bytes are kept
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoringToolInfo {
    pub uri: Vec<u8>,
    pub packing_enabled: bool,
}

impl AuthoringToolInfo {
    pub fn new(uri: impl Into<Vec<u8>>) -> Self {
        Self {
            uri: uri.into(),
            packing_enabled: true,
        }
    }

    pub fn uri_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.uri).ok()
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
        body_len: u32,
    ) -> Result<Self, ParseError> {
        if body_len == 0 {
            return Err(ParseError::Corruption(
                "authoring tool info has an empty body",
            ));
        }

        let mut bytes = vec![0u8; body_len as usize];
        reader.get_aligned_bytes(&mut bytes)?;

        if bytes.pop() != Some(0) {
            return Err(ParseError::Corruption(
                "authoring tool info is not NUL-terminated",
            ));
        }

        Ok(Self {
            uri: bytes,
            packing_enabled: true,
        })
    }

    fn write_body(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_bytes(&self.uri)?;
        writer.put_n(8, 0u32)
    }

    pub fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        let mut body = BitstreamIoWriter::new();
        self.write_body(&mut body)?;
        write_envelope(writer, ElementId::AuthoringToolInfo, &body.into_bytes()?)
    }

    pub fn validate(&self, ctx: &mut ValidationCtx<'_>) -> bool {
        if !registry::params(ConstraintSet::DbyCinema).allow_authoring_tool_info
            && !ctx.report(
                IssueId::AuthoringToolInfo,
                ConstraintSet::DbyCinema,
                ErrorCode::DbyCinemaAuthoringToolInfoNotAnAllowedSubElement,
            )
        {
            return false;
        }

        true
    }
}

/// Opaque user payload identified by a 16-byte SMPTE label.
#[derive(Debug, Clone, PartialEq)]
pub struct UserData {
    pub user_id: [u8; 16],
    pub data: Vec<u8>,
    pub packing_enabled: bool,
}

impl UserData {
    pub fn new(user_id: [u8; 16], data: Vec<u8>) -> Self {
        Self {
            user_id,
            data,
            packing_enabled: true,
        }
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
        body_len: u32,
    ) -> Result<Self, ParseError> {
        if body_len < 16 {
            return Err(ParseError::Corruption(
                "user data body is shorter than its SMPTE label",
            ));
        }

        let mut user_id = [0u8; 16];
        reader.get_aligned_bytes(&mut user_id)?;

        let mut data = vec![0u8; (body_len - 16) as usize];
        reader.get_aligned_bytes(&mut data)?;

        Ok(Self {
            user_id,
            data,
            packing_enabled: true,
        })
    }

    fn write_body(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_bytes(&self.user_id)?;
        writer.put_bytes(&self.data)
    }

    pub fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        let mut body = BitstreamIoWriter::new();
        self.write_body(&mut body)?;
        write_envelope(writer, ElementId::UserData, &body.into_bytes()?)
    }

    pub fn validate(&self, ctx: &mut ValidationCtx<'_>) -> bool {
        if !registry::params(ConstraintSet::DbyCinema).allow_user_data
            && !ctx.report(
                IssueId::UserData,
                ConstraintSet::DbyCinema,
                ErrorCode::UserDataNotAnAllowedSubElement,
            )
        {
            return false;
        }

        true
    }
}
