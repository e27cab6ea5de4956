use cucumber::given;
use proxy_order_engine::db_types::{NewOrderCycle, NewSchedule, NewSubscription};

use crate::cucumber::{
    world::{day, ProxyOrderSystem},
    ProxyOrderWorld,
};

#[given("a fresh install")]
async fn fresh_database(world: &mut ProxyOrderWorld) {
    let system = ProxyOrderSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a schedule {string} with {int} daily order cycles starting on day {int}")]
async fn daily_schedule(world: &mut ProxyOrderWorld, name: String, count: i64, first_day: i64) {
    let mut ids = Vec::new();
    for d in first_day..first_day + count {
        let oc_name = format!("Day {d}");
        let oc = NewOrderCycle::new(oc_name.clone(), day(d), day(d + 1)).with_coordinator("hub");
        let oc = world.system().schedules.create_order_cycle(oc).await.expect("Error creating order cycle");
        ids.push(oc.id);
        world.order_cycles.insert(oc_name, oc);
    }
    let schedule = world
        .system()
        .schedules
        .create_schedule(NewSchedule::new(name.clone()).with_order_cycles(&ids))
        .await
        .expect("Error creating schedule");
    world.schedules.insert(name, schedule.id);
}

#[given(expr = "a subscription for '{word}' on schedule {string} from day {int} until day {int}")]
async fn subscription(world: &mut ProxyOrderWorld, customer: String, schedule: String, from: i64, until: i64) {
    let schedule_id = *world.schedules.get(&schedule).expect("Unknown schedule");
    let new_sub = NewSubscription::new(customer.clone(), schedule_id).beginning_at(day(from)).ending_at(day(until));
    // Inserted directly so that the first sync is the one under test
    let sub = proxy_order_engine::SubscriptionManagement::insert_subscription(&world.system().db, new_sub)
        .await
        .expect("Error creating subscription");
    world.subscriptions.insert(customer, sub);
}
