// Matching a topic stream against a population of subscribers, each carrying
// a list of topic-pattern subscriptions.
//
// Run with: cargo run --example pubsub

use skipfilter::SkipFilter;
use wildmatch::WildMatch;

#[derive(Clone, PartialEq, Eq, Hash)]
struct Subscriber {
    name: &'static str,
    subscriptions: Vec<&'static str>,
}

fn main() {
    let mut subscribers = SkipFilter::new(
        |subscriber: &Subscriber, topic: &String| {
            subscriber.subscriptions.iter().any(|pattern| WildMatch::new(pattern).matches(topic))
        },
        0,
    );

    subscribers.add(Subscriber { name: "alice", subscriptions: vec!["metrics.*"] });
    subscribers.add(Subscriber { name: "bob", subscriptions: vec!["logs.*", "metrics.cpu"] });
    subscribers.add(Subscriber { name: "carol", subscriptions: vec!["*"] });

    // Each subscriber is tested against a topic at most once; repeating a
    // topic is served from its cached bitmap.
    for topic in ["metrics.cpu", "logs.disk", "metrics.cpu", "audit.login"] {
        let matched = subscribers.match_any(&[topic.to_string()]);
        let names: Vec<_> = matched.iter().map(|s| s.name).collect();
        println!("{topic}: {names:?}");
    }

    let bob = Subscriber { name: "bob", subscriptions: vec!["logs.*", "metrics.cpu"] };
    subscribers.remove(&bob);
    let matched = subscribers.match_any(&["metrics.cpu".to_string()]);
    println!("after bob unsubscribes: {:?}", matched.iter().map(|s| s.name).collect::<Vec<_>>());

    let stats = subscribers.cache_stats();
    println!(
        "cache: {} lookups, {} hits ({:.0}% hit rate)",
        stats.lookups,
        stats.hits,
        stats.hit_rate() * 100.0
    );
}
