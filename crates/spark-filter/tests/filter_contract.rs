//! 过滤引擎对外契约的性质验证。
//!
//! # 教案级导览
//!
//! - **Why**：依赖声明的相等性建立在“规范化文本”之上，若规范化文本无法稳定还原为相同谓词，
//!   依赖去重与复制都会出现隐性偏差；
//! - **How**：以 Proptest 随机构造谓词树（含需要转义的特殊字符与通配片段），
//!   断言 `parse(filter.to_string())` 得到与规范化后的原树相等的结果，并验证 [`combine`] 的代数性质；
//! - **What**：仅依赖公开 API，不触及解析器内部状态。

use proptest::prelude::*;
use spark_filter::{Comparator, Criteria, Filter, Operator, Properties, PropertyValue, combine, parse};

fn comparator() -> impl Strategy<Value = Comparator> {
    prop_oneof![
        Just(Comparator::Equal),
        Just(Comparator::Approximate),
        Just(Comparator::LessOrEqual),
        Just(Comparator::Less),
        Just(Comparator::GreaterOrEqual),
        Just(Comparator::Greater),
    ]
}

/// 属性名允许两端空白与需要转义的字符，构造出的名称必须与解析结果一致。
const NAME: &str = r"[ \t]{0,2}[a-z][a-zA-Z0-9.()*=<>~\\ ]{0,6}[ \t]{0,2}";

fn leaf() -> impl Strategy<Value = Filter> {
    let exact = (NAME, comparator(), "[ -~]{0,8}")
        .prop_map(|(name, comparator, value)| Filter::criteria(name, comparator, value));
    let pattern = (
        NAME,
        prop::collection::vec("[ -~]{0,4}", 2..4),
    )
        .prop_map(|(name, segments)| Filter::Criteria(Criteria::pattern(name, segments)));
    prop_oneof![3 => exact, 1 => pattern]
}

fn filter_tree() -> impl Strategy<Value = Filter> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Filter::And),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Filter::Or),
            inner.prop_map(Filter::negate),
        ]
    })
}

proptest! {
    #[test]
    fn prop_canonical_text_reparses_to_equal_filter(filter in filter_tree()) {
        let normalized = filter.normalize();
        let text = normalized.to_string();
        let reparsed = parse(&text);
        prop_assert_eq!(reparsed, Ok(Some(normalized)));
    }

    #[test]
    fn prop_combine_with_single_operand_is_identity(filter in filter_tree(), before in 0usize..3, after in 0usize..3) {
        let mut operands: Vec<Option<Filter>> = vec![None; before];
        operands.push(Some(filter.clone()));
        operands.extend(std::iter::repeat_n(None, after));
        prop_assert_eq!(combine(operands, Operator::Or), Some(filter));
    }

    #[test]
    fn prop_and_combination_is_conjunction(
        left in filter_tree(),
        right in filter_tree(),
        version in -5i64..20,
        color in prop_oneof![Just("red"), Just("blue"), Just("Dark Red")],
    ) {
        let props: Properties = [
            ("version", PropertyValue::from(version)),
            ("color", PropertyValue::from(color)),
        ]
        .into_iter()
        .collect();
        let combined = combine([Some(left.clone()), Some(right.clone())], Operator::And)
            .expect("两个操作数必然产生组合");
        prop_assert_eq!(
            combined.matches(&props),
            left.matches(&props) && right.matches(&props)
        );
    }
}

#[test]
fn equal_inputs_produce_equal_text() {
    let first = parse("(&(color=red)(size>=10))").unwrap();
    let second = parse("( & (color=red) (size >=10) )").unwrap();
    assert_eq!(
        first.map(|filter| filter.to_string()),
        second.map(|filter| filter.to_string())
    );
}

#[test]
fn documented_example_evaluates() {
    let filter = parse("(&(color=red)(size>=10))").unwrap().unwrap();
    let mut props = Properties::new();
    props.insert("color", "red");
    props.insert("size", 10);
    assert!(filter.matches(&props));

    props.insert("size", 9);
    assert!(!filter.matches(&props));
}
