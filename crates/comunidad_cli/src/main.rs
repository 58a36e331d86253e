//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `comunidad_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("comunidad_core ping={}", comunidad_core::ping());
    println!("comunidad_core version={}", comunidad_core::core_version());
}
