//! Plan report: a format-neutral row/section model, the tree renderer and
//! assembler that build it, and serializers that turn it into HTML or JSON.

pub mod rows;
pub mod render;
pub mod assemble;
pub mod render_html;
pub mod render_json;

pub use rows::*;
pub use render::PlanTreeRenderer;
pub use assemble::ReportAssembler;
pub use render_html::render_html;
pub use render_json::render_json;

#[cfg(test)]
mod tests;
