//! Testing utilities and harness for Canopy

pub mod tracer;
pub mod testing;

pub use tracer::{tracer_events, take_tracer_events, Tracer, Switch};
pub use testing::*;

pub mod prelude {
    pub use crate::tracer::{take_tracer_events, Tracer, Switch};
    pub use crate::testing::*;
    pub use canopy_core::{
        AdapterOp, Component, ComponentContext, ComponentType, ElementType, IdTarget, LiveNode,
        Props, Render, RenderError, Root, VNode,
    };
}
