use serde::{Deserialize, Serialize};

use crate::constants::{INSTANCE_NAME, OBJECTCLASS};
use crate::error::SettingsError;

/// 组件上下文使用的保留属性键。
///
/// ## 设计目的（Why）
/// - 类型标签键与实例名键是注册表、依赖谓词与实例上下文之间的隐式协议；
///   集中为一份配置，宿主在与其它框架互通时可以整体替换，而不必修改各处常量。
///
/// ## 契约定义（What）
/// - 缺省值分别为 [`OBJECTCLASS`] 与 [`INSTANCE_NAME`]；
/// - TOML 中未出现的字段取缺省值，出现未知字段或空字符串时报错；
/// - 设置随 [`FactoryContext`](crate::FactoryContext) 传递，同一工厂的所有实例观察到相同的键。
///
/// ```rust
/// use spark_component::ContextSettings;
///
/// let settings = ContextSettings::from_toml_str(r#"instance_name_key = "component.name""#).unwrap();
/// assert_eq!(settings.type_tag_key, "objectClass");
/// assert_eq!(settings.instance_name_key, "component.name");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextSettings {
    /// 依赖谓词测试的类型标签键。
    pub type_tag_key: String,
    /// 实例属性中强制写入实例名的键。
    pub instance_name_key: String,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            type_tag_key: OBJECTCLASS.to_owned(),
            instance_name_key: INSTANCE_NAME.to_owned(),
        }
    }
}

impl ContextSettings {
    /// 从 TOML 文本加载并校验。
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验保留键均非空。
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.type_tag_key.trim().is_empty() {
            return Err(SettingsError::EmptyKey {
                key: "type_tag_key",
            });
        }
        if self.instance_name_key.trim().is_empty() {
            return Err(SettingsError::EmptyKey {
                key: "instance_name_key",
            });
        }
        Ok(())
    }
}
