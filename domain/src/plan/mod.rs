//! Plan domain module: the single-step tool decision.
//!
//! The planning step asks the model for one of two strict JSON shapes;
//! [`parse_plan`](parser::parse_plan) turns the reply into a closed
//! [`Plan`](entities::Plan) or a [`PlanRejection`](entities::PlanRejection).

pub mod entities;
pub mod parser;
