//! 工厂上下文共享状态的并发竞争测试。
//!
//! # 教案级导览
//! - **Why**：同一工厂的实例可能在多个线程上同时创建，并同时首次访问同一处理器配置或绑定 Bundle 上下文；
//! - **How**：以 `Barrier` 让所有线程在同一时刻发起调用，放大竞争窗口，再断言只有一个写入生效；
//! - **What**：首读即插对所有线程返回同一个值；Bundle 上下文恰有一个获胜者。

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use spark_component::{
    BundleContext, ComponentContext, FactoryContext, HandlerConfig, Properties, PropertyValue,
};

const THREADS: usize = 16;

#[derive(Debug)]
struct TestBundle {
    id: u64,
}

impl BundleContext for TestBundle {
    fn bundle_id(&self) -> u64 {
        self.id
    }

    fn symbolic_name(&self) -> &str {
        "test.bundle"
    }
}

fn shared_factory() -> Arc<FactoryContext> {
    let mut factory = FactoryContext::new("Contended").expect("工厂名合法");
    factory.mark_completed();
    Arc::new(factory)
}

/// ## 首读即插：不同缺省值的并发首访只保留一个
#[test]
fn racing_first_access_observes_a_single_default() {
    let factory = shared_factory();
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|index| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let default = Some(HandlerConfig::Value(PropertyValue::from(index as i64)));
                barrier.wait();
                factory.handler_or_insert("contended", default)
            })
        })
        .collect();

    let observed: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().expect("工作线程不应 panic"))
        .collect();

    let first = observed[0].clone();
    assert!(first.is_some());
    assert!(observed.iter().all(|value| *value == first), "所有线程必须观察到同一个缺省值");
    assert_eq!(factory.handler("contended"), first);
    assert_eq!(factory.handler_ids(), vec!["contended".to_owned()]);
}

/// ## 实例并发创建：各自读取处理器配置，存储中只登记一次
#[test]
fn instances_built_concurrently_share_handler_state() {
    let factory = shared_factory();
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|index| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let ctx = ComponentContext::new(factory, format!("inst-{index}"), &Properties::new())
                    .expect("构造成功");
                assert_eq!(ctx.handler("lazy"), None);
                ctx.name().to_owned()
            })
        })
        .collect();

    let names: HashSet<String> = workers
        .into_iter()
        .map(|worker| worker.join().expect("工作线程不应 panic"))
        .collect();
    assert_eq!(names.len(), THREADS);
    assert_eq!(factory.handler_ids(), vec!["lazy".to_owned()]);
}

/// ## Bundle 上下文：恰有一个获胜者
#[test]
fn racing_bundle_context_binding_has_one_winner() {
    let factory = shared_factory();
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS as u64)
        .map(|id| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let won = factory.set_bundle_context(Arc::new(TestBundle { id }));
                (id, won)
            })
        })
        .collect();

    let winners: Vec<u64> = workers
        .into_iter()
        .map(|worker| worker.join().expect("工作线程不应 panic"))
        .filter_map(|(id, won)| won.then_some(id))
        .collect();

    assert_eq!(winners.len(), 1, "恰有一个线程绑定成功");
    assert_eq!(
        factory.bundle_context().map(|ctx| ctx.bundle_id()),
        Some(winners[0])
    );
}
