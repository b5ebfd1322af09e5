//! MindTouch Core Library
//!
//! Constrained manipulation and attachment geometry for a multitouch
//! mind-map: border-clamped drag and rotate, inertia, interest filters for
//! nested nodes, touch points, and edges that stay glued to their nodes.

pub mod config;
pub mod controller;
pub mod engine;
pub mod geometry;
pub mod gesture;
pub mod markers;
pub mod relation;
pub mod scene;
pub mod touch;

pub use config::{ConfigError, ManipulationConfig};
pub use controller::{Controller, ControllerStack, ControllerStatus};
pub use engine::{ManipulationEngine, Processor};
pub use geometry::{BorderBounds, nearest_pair, sort_by_distance};
pub use gesture::{
    DragMachine, GestureEvent, GestureId, GestureKind, GesturePhase, GestureState,
    InertiaController, InertiaState, InterestFilter, RotateMachine,
};
pub use markers::MarkerContainer;
pub use relation::{Relation, RelationUpdater, connect, disconnect};
pub use scene::{
    Capabilities, ComponentId, ComponentKind, Outline, Scene, SceneError, SceneGraph, SceneResult,
};
pub use touch::{Compass, TouchPoint, TouchPoints, TouchSelection, touch_points};
