use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::dao::models::{AccessGroup, Document, GroupId, Record, RecordId};

pub const RECORD_PREFIX: &str = "record::";
pub const GROUP_PREFIX: &str = "group::";
pub const ACCOUNT_PREFIX: &str = "account::";

/// Stored shape of one arena record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchRecordDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub record_id: RecordId,
    pub group: GroupId,
    pub version: u64,
    pub body: Record,
}

impl CouchRecordDocument {
    pub fn from_document(document: Document, rev: Option<String>) -> Self {
        Self {
            id: record_doc_id(document.id),
            rev,
            record_id: document.id,
            group: document.group,
            version: document.version,
            body: document.record,
        }
    }

    pub fn to_document(&self) -> Document {
        Document {
            id: self.record_id,
            group: self.group,
            version: self.version,
            record: self.body.clone(),
        }
    }
}

/// Stored access group. Groups are written once, so the body carries no
/// `_id` or `_rev`: CouchDB takes the ID from the URL path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGroupDocument {
    /// Members and roles of the group.
    pub group: AccessGroup,
}

/// Binding of an account to its root record.
///
/// The body carries no `_id`: CouchDB takes it from the decoded URL path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchAccountDocument {
    /// Root record of the account.
    pub root: RecordId,
}

pub fn record_doc_id(id: RecordId) -> String {
    format!("{RECORD_PREFIX}{id}")
}

pub fn group_doc_id(id: GroupId) -> String {
    format!("{GROUP_PREFIX}{id}")
}

/// Everything outside the RFC 3986 unreserved set is escaped.
const ACCOUNT_ID_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Account identifiers are provider-issued, so they are percent-encoded to stay
/// a single URL path segment.
pub fn account_doc_id(account: &str) -> String {
    format!(
        "{ACCOUNT_PREFIX}{}",
        utf8_percent_encode(account, ACCOUNT_ID_ESCAPES)
    )
}
