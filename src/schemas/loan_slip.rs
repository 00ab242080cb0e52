//! Create and update form rulesets for loan slips
//!
//! Field bounds come from the `validator` derive; image limits and the
//! cross-field rules are checked in `validate_form`, which reports every
//! failure against the field the user has to fix.

use std::borrow::Cow;

use chrono::{NaiveDate, Utc};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{CreateLoanSlip, ImageUpload, LoanSlip, LoanStatus};

/// Most images a loan slip can carry
pub const MAX_IMAGES: usize = 5;
/// Largest accepted image, in bytes
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;
/// Media types accepted for uploads, by both forms
pub const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Size and media type of every file, plus the per-list count
fn check_image_files(field: &'static str, files: &[ImageUpload], errors: &mut ValidationErrors) {
    if files.len() > MAX_IMAGES {
        errors.add(field, field_error("too_many_images", "At most 5 images can be uploaded"));
    }
    if files.iter().any(|f| f.size() > MAX_IMAGE_SIZE) {
        errors.add(field, field_error("image_too_large", "Each image must be 5MB or smaller"));
    }
    if files
        .iter()
        .any(|f| !ACCEPTED_IMAGE_TYPES.contains(&f.content_type.to_ascii_lowercase().as_str()))
    {
        errors.add(
            field,
            field_error("image_type", "Only JPG, PNG or WEBP images are accepted"),
        );
    }
}

fn check_date_order(borrowed: NaiveDate, returned: NaiveDate, errors: &mut ValidationErrors) {
    if returned < borrowed {
        errors.add(
            "returned_date",
            field_error("date_order", "The return date must be on or after the borrow date"),
        );
    }
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Values of the create dialog
#[derive(Debug, Clone, Validate)]
pub struct CreateLoanSlipForm {
    #[validate(length(min = 3, max = 100, message = "The asset name must be 3 to 100 characters"))]
    pub name: String,
    #[validate(length(min = 3, max = 50, message = "The borrower name must be 3 to 50 characters"))]
    pub borrower_name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    #[validate(length(min = 10, max = 500, message = "The description must be 10 to 500 characters"))]
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub borrowed_date: NaiveDate,
    pub returned_date: NaiveDate,
    pub images: Vec<ImageUpload>,
}

impl CreateLoanSlipForm {
    pub fn new(
        name: impl Into<String>,
        borrower_name: impl Into<String>,
        borrowed_date: NaiveDate,
        returned_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            borrower_name: borrower_name.into(),
            department: None,
            position: None,
            description: None,
            serial_number: None,
            borrowed_date,
            returned_date,
            images: Vec::new(),
        }
    }

    /// Run every rule against the in-progress form; never touches the network
    pub fn validate_form(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        check_image_files("images", &self.images, &mut errors);
        check_date_order(self.borrowed_date, self.returned_date, &mut errors);
        into_result(errors)
    }
}

impl From<CreateLoanSlipForm> for CreateLoanSlip {
    fn from(form: CreateLoanSlipForm) -> Self {
        Self {
            name: form.name,
            borrower_name: form.borrower_name,
            borrowed_date: form.borrowed_date,
            returned_date: form.returned_date,
            department: form.department.unwrap_or_default(),
            position: form.position.unwrap_or_default(),
            description: form.description.unwrap_or_default(),
            serial_number: form.serial_number.unwrap_or_default(),
            images: form.images,
        }
    }
}

/// Values of the update dialog
#[derive(Debug, Clone, Validate)]
pub struct UpdateLoanSlipForm {
    #[validate(length(min = 3, max = 100, message = "The asset name must be 3 to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 3, max = 50, message = "The borrower name must be 3 to 50 characters"))]
    pub borrower_name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    #[validate(length(max = 500, message = "The description must be at most 500 characters"))]
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<LoanStatus>,
    pub borrowed_date: NaiveDate,
    pub returned_date: NaiveDate,
    pub existing_images: Vec<String>,
    pub new_images: Vec<ImageUpload>,
}

impl UpdateLoanSlipForm {
    /// Prefill the dialog from the record being edited
    ///
    /// Missing dates default to today.
    pub fn from_slip(slip: &LoanSlip) -> Self {
        let today = Utc::now().date_naive();
        Self {
            name: Some(slip.name.clone()),
            borrower_name: Some(slip.borrower_name.clone()),
            department: slip.department.clone(),
            position: slip.position.clone(),
            description: slip.description.clone(),
            serial_number: slip.serial_number.clone(),
            status: Some(slip.status),
            borrowed_date: slip.borrowed_date.unwrap_or(today),
            returned_date: slip.returned_date.unwrap_or(today),
            existing_images: slip.images.clone(),
            new_images: Vec::new(),
        }
    }

    pub fn total_images(&self) -> usize {
        self.existing_images.len() + self.new_images.len()
    }

    /// Run every rule against the in-progress form; never touches the network
    pub fn validate_form(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        if self.existing_images.len() > MAX_IMAGES {
            errors.add(
                "existing_images",
                field_error("too_many_images", "At most 5 images can be kept"),
            );
        }
        check_image_files("new_images", &self.new_images, &mut errors);
        if self.total_images() > MAX_IMAGES {
            errors.add(
                "new_images",
                field_error("total_images", "A loan slip can have at most 5 images in total"),
            );
        }
        check_date_order(self.borrowed_date, self.returned_date, &mut errors);
        into_result(errors)
    }
}
