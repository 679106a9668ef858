//! Planar mirror reflection about a horizontal plane.
//!
//! [`PlanarReflectionFeature`] builds up to three passes from
//! [`ReflectionSettings`](crate::settings::ReflectionSettings): an opaque and a
//! transparent [`ReflectionPass`] that render the scene from the mirrored
//! camera into one shared offscreen target, and an optional [`DebugBlitPass`].
//! Which pass allocates and which releases the target is fixed at build time
//! by a [`TargetRole`].

mod debug;
mod fade;
mod feature;
mod math;
mod pass;
mod target;

pub use debug::DebugBlitPass;
pub use fade::{FadeParameters, FADE_BASE_HEIGHT_ID, FADE_RANGE_ID, PLANE_HEIGHT_ID};
pub use feature::PlanarReflectionFeature;
pub use math::{gpu_projection, reflect_matrix, translate_matrix, MirrorMatrices, PLANE_HEIGHT_EPSILON};
pub use pass::{
    apply_mirror_state, capture_view, compute_mirror_view, restore_state, CapturedView,
    PassShared, ReflectionCategory, ReflectionPass,
};
pub use target::{
    assign_roles, roles_are_balanced, ReflectionTarget, TargetRole, REFLECTION_TEXTURE_ID,
    REFLECTION_TEXTURE_NAME,
};
