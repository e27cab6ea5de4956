use cucumber::{then, when};
use proxy_order_engine::{
    db_types::{ProxyOrder, ProxyOrderState, SubscriptionUpdate},
    ProxyOrderDatabase,
};

use crate::cucumber::{world::day, ProxyOrderWorld};

#[when("I sync all subscriptions")]
async fn sync_all(world: &mut ProxyOrderWorld) {
    let result = world.system().subscriptions.sync_all().await.expect("Sync failed");
    world.last_sync = Some(result);
}

#[when(expr = "the subscription for '{word}' ends on day {int}")]
async fn change_end(world: &mut ProxyOrderWorld, customer: String, d: i64) {
    let id = world.subscription(&customer).id;
    let update = SubscriptionUpdate::default().with_ends_at(Some(day(d)));
    let synced =
        world.system().subscriptions.update_subscription(id, update).await.expect("Error updating subscription");
    world.subscriptions.insert(customer, synced.value);
    world.last_sync = Some(synced.sync_result);
}

#[when(expr = "the subscription for '{word}' is cancelled")]
async fn cancel(world: &mut ProxyOrderWorld, customer: String) {
    let id = world.subscription(&customer).id;
    let synced = world.system().subscriptions.cancel_subscription(id).await.expect("Error cancelling subscription");
    world.subscriptions.insert(customer, synced.value);
    world.last_sync = Some(synced.sync_result);
}

async fn proxy_order(world: &ProxyOrderWorld, customer: &str, oc_name: &str) -> ProxyOrder {
    let sub = world.subscription(customer);
    let oc = world.order_cycle(oc_name);
    world
        .system()
        .db
        .proxy_order_for(sub.id, oc.id)
        .await
        .expect("Error fetching proxy order")
        .unwrap_or_else(|| panic!("No proxy order for {customer} in {oc_name}"))
}

#[when(expr = "the order for '{word}' in {string} is confirmed")]
async fn confirm_order(world: &mut ProxyOrderWorld, customer: String, oc_name: String) {
    let po = proxy_order(world, &customer, &oc_name).await;
    let db = &world.system().db;
    db.record_materialized_order(po.id, &format!("R-{customer}-{}", po.order_cycle_id.value()))
        .await
        .expect("Error recording order");
    db.mark_order_confirmed(po.id).await.expect("Error confirming order");
}

#[then(expr = "'{word}' has {int} active proxy orders")]
async fn active_count(world: &mut ProxyOrderWorld, customer: String, expected: i64) {
    let id = world.subscription(&customer).id;
    let count = world.system().db.count_proxy_orders(id, Some(ProxyOrderState::Active)).await.expect("Error counting");
    assert_eq!(count, expected);
}

#[then(expr = "'{word}' has {int} proxy orders in total")]
async fn total_count(world: &mut ProxyOrderWorld, customer: String, expected: i64) {
    let id = world.subscription(&customer).id;
    let count = world.system().db.count_proxy_orders(id, None).await.expect("Error counting");
    assert_eq!(count, expected);
}

#[then(expr = "the proxy order for '{word}' in {string} is {word}")]
async fn proxy_order_state(world: &mut ProxyOrderWorld, customer: String, oc_name: String, state: String) {
    let po = proxy_order(world, &customer, &oc_name).await;
    let expected = match state.as_str() {
        "active" => ProxyOrderState::Active,
        "cancelled" => ProxyOrderState::Cancelled,
        s => panic!("Unknown proxy order state {s}"),
    };
    assert_eq!(po.state, expected);
}

#[then("the last sync made no changes")]
async fn noop(world: &mut ProxyOrderWorld) {
    let result = world.last_sync();
    assert!(result.is_noop(), "Expected no changes, got {}", result.summary());
}

#[then(expr = "the last sync reactivated {int} proxy orders")]
async fn reactivated(world: &mut ProxyOrderWorld, expected: usize) {
    let result = world.last_sync();
    assert_eq!(result.reactivated, expected);
    assert_eq!(result.created, 0);
}

#[then(expr = "the last sync left {int} pinned proxy order alone")]
async fn pinned(world: &mut ProxyOrderWorld, expected: usize) {
    assert_eq!(world.last_sync().pinned, expected);
}
