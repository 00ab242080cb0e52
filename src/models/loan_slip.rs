//! Loan slip model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::dates::{self, format_wire};
use super::enums::LoanStatus;

/// Default page size of the list view
pub const DEFAULT_LIMIT: u32 = 10;

/// One borrowed-asset record as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSlip {
    pub id: i64,
    pub name: String,
    pub borrower_name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    pub status: LoanStatus,
    /// Server-assigned image URLs, in display order
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, with = "dates::wire_date_option")]
    pub borrowed_date: Option<NaiveDate>,
    #[serde(default, with = "dates::wire_date_option")]
    pub returned_date: Option<NaiveDate>,
    #[serde(default, with = "dates::timestamp_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "dates::timestamp_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LoanSlip {
    pub fn is_editable(&self) -> bool {
        self.status.is_editable()
    }

    pub fn is_deletable(&self) -> bool {
        self.status.is_deletable()
    }
}

/// One page of the loan slip list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanSlipPage {
    pub items: Vec<LoanSlip>,
    pub total: u64,
}

/// Columns the list can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    BorrowerName,
    Department,
    BorrowedDate,
    ReturnedDate,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Name,
        SortField::BorrowerName,
        SortField::Department,
        SortField::BorrowedDate,
        SortField::ReturnedDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::BorrowerName => "borrower_name",
            SortField::Department => "department",
            SortField::BorrowedDate => "borrowed_date",
            SortField::ReturnedDate => "returned_date",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Filter, sort and paging state of the list view
///
/// Serializes to the query string of `GET /api/loan-slips`; absent
/// filters are left out.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSlipQuery {
    pub search: Option<String>,
    pub status: Option<LoanStatus>,
    pub department: Option<String>,
    #[serde(default, with = "dates::wire_date_option")]
    pub borrowed_from: Option<NaiveDate>,
    #[serde(default, with = "dates::wire_date_option")]
    pub borrowed_to: Option<NaiveDate>,
    #[serde(default, with = "dates::wire_date_option")]
    pub returned_from: Option<NaiveDate>,
    #[serde(default, with = "dates::wire_date_option")]
    pub returned_to: Option<NaiveDate>,
    /// 1-based
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub sort: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl Default for LoanSlipQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            department: None,
            borrowed_from: None,
            borrowed_to: None,
            returned_from: None,
            returned_to: None,
            page: 1,
            limit: DEFAULT_LIMIT,
            sort: None,
            order: None,
        }
    }
}

impl LoanSlipQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn first_page(self) -> Self {
        self.with_page(1)
    }

    /// Same query with every filter cleared; keeps limit, search and sort
    pub fn cleared_filters(&self) -> Self {
        Self {
            search: self.search.clone(),
            limit: self.limit,
            sort: self.sort,
            order: self.order,
            ..Self::default()
        }
    }

    /// Number of active filter groups, for the filter toggle badge
    pub fn active_filter_count(&self) -> usize {
        [
            self.status.is_some(),
            self.borrowed_from.is_some() || self.borrowed_to.is_some(),
            self.returned_from.is_some() || self.returned_to.is_some(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }

    /// Index of the first record of the current page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Number of pages needed for `total` records; never less than one
pub fn total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    let pages = total.div_ceil(limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// An image selected for upload but not yet submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    /// Declared media type, e.g. `image/png`
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Create request, sent as a multipart form
#[derive(Debug, Clone, PartialEq)]
pub struct CreateLoanSlip {
    pub name: String,
    pub borrower_name: String,
    pub borrowed_date: NaiveDate,
    pub returned_date: NaiveDate,
    pub department: String,
    pub position: String,
    pub description: String,
    pub serial_number: String,
    pub images: Vec<ImageUpload>,
}

impl CreateLoanSlip {
    /// Scalar form fields, in submission order
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("borrower_name", self.borrower_name.clone()),
            ("borrowed_date", format_wire(self.borrowed_date)),
            ("returned_date", format_wire(self.returned_date)),
            ("department", self.department.clone()),
            ("position", self.position.clone()),
            ("description", self.description.clone()),
            ("serial_number", self.serial_number.clone()),
        ]
    }
}

/// Partial update request, sent as a multipart form
///
/// Absent fields are not sent and the backend leaves them unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateLoanSlip {
    pub name: Option<String>,
    pub borrower_name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<LoanStatus>,
    pub borrowed_date: Option<NaiveDate>,
    pub returned_date: Option<NaiveDate>,
    /// URLs of already-uploaded images to keep
    pub existing_images: Vec<String>,
    pub new_images: Vec<ImageUpload>,
}

impl UpdateLoanSlip {
    /// Scalar form fields, in submission order, including one
    /// `existing_images[]` entry per retained URL
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let scalars = [
            ("name", self.name.clone()),
            ("borrower_name", self.borrower_name.clone()),
            ("department", self.department.clone()),
            ("position", self.position.clone()),
            ("description", self.description.clone()),
            ("serial_number", self.serial_number.clone()),
            ("status", self.status.map(|s| s.code().to_string())),
            ("borrowed_date", self.borrowed_date.map(format_wire)),
            ("returned_date", self.returned_date.map(format_wire)),
        ];

        scalars
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .chain(self.existing_images.iter().map(|url| ("existing_images[]", url.clone())))
            .collect()
    }

    /// Names of the fields this payload carries; the image lists are always carried
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = vec![];
        let present = [
            ("name", self.name.is_some()),
            ("borrower_name", self.borrower_name.is_some()),
            ("department", self.department.is_some()),
            ("position", self.position.is_some()),
            ("description", self.description.is_some()),
            ("serial_number", self.serial_number.is_some()),
            ("status", self.status.is_some()),
            ("borrowed_date", self.borrowed_date.is_some()),
            ("returned_date", self.returned_date.is_some()),
        ];
        names.extend(present.into_iter().filter(|(_, set)| *set).map(|(name, _)| name));
        names.push("existing_images");
        names.push("new_images");
        names
    }
}
