//! NCloud REST API Client
//!
//! A Rust client library for the Naver Cloud Platform API gateways.
//! Provides typed models and one method per vendor operation for servers,
//! VPC networking (VPCs, subnets, NAT gateways) and the Kubernetes service.
//!
//! # Example
//!
//! ```no_run
//! use ncloud_client::{
//!     Credentials, DeploymentMode, Endpoints, NcloudClient, NcloudClientTrait, ServerListFilter,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NcloudClient::new(
//!     Endpoints::for_site(ncloud_client::Site::Public),
//!     Credentials::new("access-key", "secret-key"),
//!     "KR",
//! )?;
//!
//! // Look up one VPC server by instance number
//! let servers = client
//!     .get_server_instance_list(DeploymentMode::Vpc, &ServerListFilter::by_instance_no("812345"))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Request signing**: API gateway signature v2 on every call
//! - **Classic and VPC**: the server API family is selected per call
//! - **Mocking**: `test-util` exposes an in-memory `MockNcloudClient` with
//!   scripted status progressions

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod ncloud_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::NcloudClient;
pub use common::{Credentials, Endpoints, HttpClient, QueryParams, Site};
pub use error::NcloudError;
pub use models::*;
pub use ncloud_trait::NcloudClientTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockKind, MockNcloudClient, MockPhase};
