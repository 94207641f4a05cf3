//! Agent orchestration - routing, tools, and reply generation
//!
//! This crate is the conversational layer of the funda system. It:
//! - Scans a user message for upgrade intent and report mentions
//! - Routes to one of three sub-agent behaviors (action, recommendation,
//!   service) using the entitlement core's classification
//! - Executes tools (`check_entitlement`, `update_user_dataplan`) against
//!   the core stores
//! - Keeps session state (`current_plan`, `report_name`, `product_name`,
//!   `entitlement_check`) synced after every message
//!
//! # Safety Principle
//!
//! The LLM is strictly a phrasing pass. Routing, entitlement classification,
//! plan mutation, and pricing are deterministic decisions made by the core;
//! a model failure degrades to the deterministic draft reply, never to a
//! failed request.

pub mod llm;
pub mod prompts;
pub mod routing;
pub mod runtime;
pub mod tools;

pub use llm::{build_llm_client, LlmClient};
pub use routing::{route, scan_message, MessageScan, SubAgent};
pub use runtime::{AgentReply, AgentRuntime};
pub use tools::{CheckEntitlementTool, Tool, ToolRegistry, UpdateDataPlanTool};
