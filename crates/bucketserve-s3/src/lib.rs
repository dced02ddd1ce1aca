//! S3-backed object store client for BucketServe.
//!
//! Implements the core's [`ObjectStore`](bucketserve_core::store::ObjectStore)
//! boundary on top of `aws-sdk-s3`: `HeadObject` for probes, ranged
//! `GetObject` for forward-only streams. Credential resolution follows the
//! SDK default chain unless static keys are configured, so the same binary
//! works against AWS, MinIO, and anything else speaking the S3 API.

mod client;

pub use client::S3ObjectStore;
