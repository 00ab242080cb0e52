//! Shared domain enums

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a loan slip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum LoanStatus {
    Borrowing = 1,
    Returned = 2,
    Overdue = 3,
}

struct StatusRow {
    status: LoanStatus,
    slug: &'static str,
    label: &'static str,
}

/// The one mapping between numeric code, slug and display label.
/// Rows are ordered by code, starting at 1.
const STATUS_TABLE: [StatusRow; 3] = [
    StatusRow { status: LoanStatus::Borrowing, slug: "borrowing", label: "Đang mượn" },
    StatusRow { status: LoanStatus::Returned, slug: "returned", label: "Đã trả" },
    StatusRow { status: LoanStatus::Overdue, slug: "overdue", label: "Quá hạn" },
];

impl LoanStatus {
    pub const ALL: [LoanStatus; 3] = [LoanStatus::Borrowing, LoanStatus::Returned, LoanStatus::Overdue];

    fn row(self) -> &'static StatusRow {
        &STATUS_TABLE[(self as usize) - 1]
    }

    /// Numeric code sent in update payloads
    pub fn code(self) -> i16 {
        self as i16
    }

    /// Lowercase identifier used in list filters and responses
    pub fn slug(self) -> &'static str {
        self.row().slug
    }

    pub fn label(self) -> &'static str {
        self.row().label
    }

    pub fn from_code(code: i16) -> Option<Self> {
        STATUS_TABLE.iter().map(|row| row.status).find(|s| s.code() == code)
    }

    /// Parse any of the three representations: code, slug or label
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(code) = raw.parse::<i16>() {
            return Self::from_code(code);
        }
        STATUS_TABLE
            .iter()
            .find(|row| row.slug.eq_ignore_ascii_case(raw) || row.label == raw)
            .map(|row| row.status)
    }

    /// Only slips still on loan may be edited
    pub fn is_editable(self) -> bool {
        self == LoanStatus::Borrowing
    }

    /// Only slips still on loan may be deleted
    pub fn is_deletable(self) -> bool {
        self == LoanStatus::Borrowing
    }
}

impl TryFrom<i16> for LoanStatus {
    type Error = i16;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

impl From<LoanStatus> for i16 {
    fn from(s: LoanStatus) -> Self {
        s.code()
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for LoanStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

impl<'de> Deserialize<'de> for LoanStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawStatus {
            Code(i16),
            Text(String),
        }

        match RawStatus::deserialize(deserializer)? {
            RawStatus::Code(code) => LoanStatus::from_code(code)
                .ok_or_else(|| de::Error::custom(format!("unknown loan status code: {}", code))),
            RawStatus::Text(text) => LoanStatus::parse(&text)
                .ok_or_else(|| de::Error::custom(format!("unknown loan status: {}", text))),
        }
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Dashboard role of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// May change status and dates only
    Admin,
    /// May change every editable field
    It,
    Other(String),
}

/// Which fields of a loan slip a role may submit in an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScope {
    /// Status, dates and images
    Restricted,
    /// Every editable field
    Full,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::It => "IT",
            Role::Other(role) => role,
        }
    }

    /// `None` when the role may not modify loan slips at all
    pub fn update_scope(&self) -> Option<UpdateScope> {
        match self {
            Role::Admin => Some(UpdateScope::Restricted),
            Role::It => Some(UpdateScope::Full),
            Role::Other(_) => None,
        }
    }
}

impl From<&str> for Role {
    fn from(v: &str) -> Self {
        match v {
            "admin" => Role::Admin,
            v if v.eq_ignore_ascii_case("it") => Role::It,
            other => Role::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::from(raw.as_str()))
    }
}
