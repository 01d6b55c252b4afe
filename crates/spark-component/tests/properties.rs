//! 依赖声明与实例上下文的性质验证。
//!
//! - **Why**：依赖谓词的“类型标签合取”与实例名强制写入是整个框架正确性的根基，
//!   用随机输入覆盖手写用例难以穷举的组合；
//! - **What**：
//!   1. 复制得到的声明与原声明相等；
//!   2. 声明命中当且仅当类型标签匹配且用户过滤条件匹配；
//!   3. 任意覆盖属性下，实例名键恒等于实例名，其余键遵循“覆盖优先、缺省兜底”。

use std::sync::Arc;

use proptest::prelude::*;
use spark_component::{
    ComponentContext, FactoryContext, Filter, FilterInput, Properties, PropertyValue, Requirement,
};
use spark_filter::Comparator;

fn specification() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("svc.Foo".to_owned()),
        Just("svc.Bar".to_owned()),
        "[a-z]{1,4}\\.[A-Z][a-z]{1,5}",
    ]
}

fn user_filter() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        (0i64..6).prop_map(|n| Some(format!("(version>={n})"))),
        (0i64..6).prop_map(|n| Some(format!("(!(version={n}))"))),
        prop_oneof![Just("eu"), Just("us")].prop_map(|zone| Some(format!("(|(zone={zone})(zone=*ap*))"))),
    ]
}

/// 以编程方式构造的过滤条件，属性名可带两端空白与需转义的字符。
fn prebuilt_filter() -> impl Strategy<Value = Filter> {
    let comparator = prop_oneof![
        Just(Comparator::Equal),
        Just(Comparator::Approximate),
        Just(Comparator::GreaterOrEqual),
        Just(Comparator::Less),
    ];
    (r"[ \t]{0,2}[a-z][a-z.()*=<>\\ ]{0,5}[ \t]{0,2}", comparator, "[ -~]{0,6}")
        .prop_map(|(name, comparator, value)| Filter::criteria(name, comparator, value))
}

fn filter_input() -> impl Strategy<Value = FilterInput> {
    prop_oneof![
        user_filter().prop_map(FilterInput::from),
        prebuilt_filter().prop_map(FilterInput::from),
        (prebuilt_filter(), prebuilt_filter())
            .prop_map(|(left, right)| FilterInput::from(Filter::Or(vec![left, Filter::negate(right)]))),
    ]
}

proptest! {
    #[test]
    fn prop_copy_equals_original(
        specification in specification(),
        aggregate in any::<bool>(),
        optional in any::<bool>(),
        filter in filter_input(),
    ) {
        let requirement = Requirement::new(specification, aggregate, optional, filter)
            .expect("生成的声明均合法");
        let copy = requirement.copy();
        prop_assert_eq!(copy.original_filter(), requirement.original_filter());
        prop_assert_eq!(copy, requirement);
    }

    #[test]
    fn prop_match_is_type_tag_and_user_filter(
        specification in specification(),
        advertised in prop::option::of(specification()),
        version in prop::option::of(0i64..6),
        zone in prop::option::of(prop_oneof![Just("eu"), Just("us"), Just("ap-south")]),
        filter in user_filter(),
    ) {
        let requirement = Requirement::new(specification.as_str(), false, false, filter.clone())
            .expect("生成的声明均合法");

        let mut props = Properties::new();
        if let Some(advertised) = &advertised {
            props.insert("objectClass", advertised.as_str());
        }
        if let Some(version) = version {
            props.insert("version", version);
        }
        if let Some(zone) = zone {
            props.insert("zone", zone);
        }

        let tag_matches = advertised.as_deref() == Some(specification.as_str());
        let user_matches = match filter.as_deref() {
            None | Some("") => true,
            Some(text) => spark_filter::parse(text)
                .expect("生成的过滤文本均合法")
                .is_none_or(|user| user.matches(&props)),
        };
        prop_assert_eq!(requirement.matches(&props), tag_matches && user_matches);
    }

    #[test]
    fn prop_instance_name_is_always_forced(
        name in "[a-z][a-z0-9-]{0,8}",
        defaults in prop::collection::btree_map(
            prop_oneof![Just("level"), Just("color"), Just("instance.name")],
            "[a-z]{0,5}",
            0..3,
        ),
        overrides in prop::collection::btree_map(
            prop_oneof![Just("level"), Just("zone"), Just("instance.name")],
            "[a-z]{0,5}",
            0..3,
        ),
    ) {
        let mut factory = FactoryContext::new("Foo").expect("工厂名合法");
        for (key, value) in &defaults {
            factory.set_property(*key, value.as_str());
        }
        factory.mark_completed();

        let overrides: Properties = overrides.into_iter().collect();
        let snapshot = overrides.clone();
        let ctx = ComponentContext::new(Arc::new(factory), name.as_str(), &overrides)
            .expect("构造成功");

        prop_assert_eq!(ctx.property("instance.name"), Some(&PropertyValue::from(name.as_str())));
        for key in ["level", "color", "zone"] {
            let expected = overrides
                .get(key)
                .cloned()
                .or_else(|| defaults.get(key).map(|value| PropertyValue::from(value.as_str())));
            prop_assert_eq!(ctx.property(key).cloned(), expected);
        }
        prop_assert_eq!(overrides, snapshot);
    }
}
