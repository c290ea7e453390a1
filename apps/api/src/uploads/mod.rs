//! Resume upload and asynchronous AI analysis.
//!
//! `POST /upload/` stores the file, records it as `pending` and enqueues it.
//! A background job then walks the record through `processing` to `complete`
//! or `failed`; clients poll `GET /status/{upload_id}/`.

pub mod analysis;
pub mod handlers;
pub mod pdf;
pub mod prompts;
pub mod queue;
pub mod repository;
pub mod storage;
