//! 序列构建层
//!
//! 把一条标注记录变成模型可以直接消费的多模态序列：
//!
//! ```text
//! reference (引用表) → resolver (替换) → segmenter (分段) → target (目标定位)
//! ```
//!
//! 本层是纯函数式的：不做 IO，不认识数据集，也不关心后端。

pub mod builder;
pub mod reference;
pub mod resolver;
pub mod segmenter;
pub mod target;

pub use builder::{AppendedField, SequenceBuilder, SequenceConfig};
pub use reference::{Binding, ReferenceTable};
pub use resolver::{image_path, Resolver};
pub use segmenter::Segmenter;
pub use target::{figure_matches, locate_target};
