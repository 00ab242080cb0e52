//! Loan slip resource service

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Method,
};

use crate::{
    api::ApiClient,
    error::ApiError,
    models::{CreateLoanSlip, ImageUpload, LoanSlip, LoanSlipPage, LoanSlipQuery, UpdateLoanSlip},
};

const LOAN_SLIPS_PATH: &str = "/api/loan-slips";

/// Request/response mapping for `/api/loan-slips`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanSlipApi: Send + Sync {
    /// One page of the filtered list
    async fn list(&self, query: &LoanSlipQuery) -> Result<LoanSlipPage, ApiError>;

    /// Single record; `None` when the backend reports `NOT_FOUND`
    async fn get(&self, id: i64) -> Result<Option<LoanSlip>, ApiError>;

    async fn create(&self, payload: CreateLoanSlip) -> Result<LoanSlip, ApiError>;

    async fn update(&self, id: i64, payload: UpdateLoanSlip) -> Result<LoanSlip, ApiError>;

    async fn delete(&self, id: i64) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct LoanSlipService {
    client: ApiClient,
}

impl LoanSlipService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn image_part(image: ImageUpload) -> Result<Part, ApiError> {
    Ok(Part::bytes(image.bytes)
        .file_name(image.file_name)
        .mime_str(&image.content_type)?)
}

fn text_form(fields: Vec<(&'static str, String)>) -> Form {
    fields
        .into_iter()
        .fold(Form::new(), |form, (key, value)| form.text(key, value))
}

/// Multipart body of the create request: scalar fields then `images` parts
pub fn create_form(payload: CreateLoanSlip) -> Result<Form, ApiError> {
    let mut form = text_form(payload.text_fields());
    for image in payload.images {
        form = form.part("images", image_part(image)?);
    }
    Ok(form)
}

/// Multipart body of the update request: present fields, retained
/// `existing_images[]` URLs, then `new_images` parts
pub fn update_form(payload: UpdateLoanSlip) -> Result<Form, ApiError> {
    let mut form = text_form(payload.text_fields());
    for image in payload.new_images {
        form = form.part("new_images", image_part(image)?);
    }
    Ok(form)
}

#[async_trait]
impl LoanSlipApi for LoanSlipService {
    async fn list(&self, query: &LoanSlipQuery) -> Result<LoanSlipPage, ApiError> {
        self.client.get_json(LOAN_SLIPS_PATH, query).await
    }

    async fn get(&self, id: i64) -> Result<Option<LoanSlip>, ApiError> {
        let path = format!("{}/{}", LOAN_SLIPS_PATH, id);
        match self.client.get::<LoanSlip>(&path).await {
            Ok(slip) => Ok(Some(slip)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create(&self, payload: CreateLoanSlip) -> Result<LoanSlip, ApiError> {
        let form = create_form(payload)?;
        self.client.send_multipart(Method::POST, LOAN_SLIPS_PATH, form).await
    }

    async fn update(&self, id: i64, payload: UpdateLoanSlip) -> Result<LoanSlip, ApiError> {
        let form = update_form(payload)?;
        let path = format!("{}/{}", LOAN_SLIPS_PATH, id);
        self.client.send_multipart(Method::PUT, &path, form).await
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("{}/{}", LOAN_SLIPS_PATH, id)).await
    }
}
