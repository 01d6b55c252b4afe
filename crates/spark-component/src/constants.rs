//! 保留属性键与知名处理器标识。

/// 服务属性中保存其声明规格名（一个或多个）的键，每个依赖谓词都会测试该键。
pub const OBJECTCLASS: &str = "objectClass";

/// 组件实例属性中保存实例名的键，始终等于所属 [`ComponentContext`](crate::ComponentContext) 的名称。
pub const INSTANCE_NAME: &str = "instance.name";

/// 工厂声明的知名处理器标识。
pub mod handlers {
    /// 依赖注入处理器，配置为 [`HandlerConfig::Requirements`](crate::HandlerConfig::Requirements)。
    pub const REQUIRES: &str = "spark.component.requires";
    /// 服务提供处理器。
    pub const PROVIDES: &str = "spark.component.provides";
    /// 属性注入处理器。
    pub const PROPERTIES: &str = "spark.component.properties";
}
