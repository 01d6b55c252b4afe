//! 生命周期事件、回调引用与外部 Bundle 上下文契约。
//!
//! 工厂上下文只**记录**“某事件触发哪个方法”，回调的调度与执行属于外部生命周期管理器。

use std::fmt;
use std::sync::Arc;

/// 组件生命周期事件。
///
/// 字段级事件（`BindField` 等）额外按字段名区分，见
/// [`FactoryContext::set_field_callback`](crate::FactoryContext::set_field_callback)。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum LifecycleEvent {
    Validate,
    Invalidate,
    Bind,
    Update,
    Unbind,
    BindField,
    UpdateField,
    UnbindField,
    PostRegistration,
    PostUnregistration,
}

impl LifecycleEvent {
    /// 全部事件，按声明顺序排列。
    pub const ALL: [LifecycleEvent; 10] = [
        Self::Validate,
        Self::Invalidate,
        Self::Bind,
        Self::Update,
        Self::Unbind,
        Self::BindField,
        Self::UpdateField,
        Self::UnbindField,
        Self::PostRegistration,
        Self::PostUnregistration,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Invalidate => "invalidate",
            Self::Bind => "bind",
            Self::Update => "update",
            Self::Unbind => "unbind",
            Self::BindField => "bind_field",
            Self::UpdateField => "update_field",
            Self::UnbindField => "unbind_field",
            Self::PostRegistration => "post_registration",
            Self::PostUnregistration => "post_unregistration",
        }
    }

    /// 从 [`as_str`](Self::as_str) 的输出解析事件，未知名称返回 `None`。
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == text)
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 组件实现上的回调方法引用。
///
/// 只保存方法名，克隆时共享同一份字符串。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallbackRef(Arc<str>);

impl CallbackRef {
    pub fn new(method: impl AsRef<str>) -> Self {
        Self(Arc::from(method.as_ref()))
    }

    pub fn method(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CallbackRef {
    fn from(method: &str) -> Self {
        Self::new(method)
    }
}

impl fmt::Display for CallbackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 工厂所属 Bundle 的宿主上下文。
///
/// # 契约说明（What）
/// - 由宿主框架实现，本 crate 只做不透明的持有与转交；
/// - 工厂上下文对其仅做一次性绑定，见
///   [`FactoryContext::set_bundle_context`](crate::FactoryContext::set_bundle_context)。
pub trait BundleContext: Send + Sync + fmt::Debug {
    /// Bundle 的数值标识。
    fn bundle_id(&self) -> u64;

    /// Bundle 的符号名。
    fn symbolic_name(&self) -> &str;
}
