use callchan::{alts, select, Channel, ChannelBuilder, Reader};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sums: Channel<(i32, i32)> = ChannelBuilder::new().name("sums").build();
    let products: Channel<(i32, i32)> = ChannelBuilder::new().name("products").build();
    let approvals: Channel<()> = ChannelBuilder::new().name("approvals").build();

    // requests written before anyone listens are kept until the first reader
    sums.write((5, 10));

    alts(
        |channel: &Channel<(i32, i32)>, &(a, b): &(i32, i32)| {
            println!("{} requested with: ({}, {})", channel.name(), a, b);
        },
        [&sums, &products],
    );

    sums.read(&Reader::new(|_: &Channel<(i32, i32)>, &(a, b): &(i32, i32)| {
        println!("{} + {} = {}", a, b, a + b);
    }));

    // every product needs an approval before the printer sees it
    products
        .read(&Reader::new({
            let approvals = approvals.clone();
            move |products: &Channel<(i32, i32)>, _: &(i32, i32)| {
                products.block_until(&approvals);
            }
        }))
        .read(&Reader::new(|_: &Channel<(i32, i32)>, &(a, b): &(i32, i32)| {
            println!("{} * {} = {}", a, b, a * b);
        }));

    products.write((5, 10));
    println!("waiting for approval");
    approvals.write(());

    select(
        |channel: &Channel<(i32, i32)>, _: &(i32, i32)| {
            println!("first request after this point came from {}", channel.name());
        },
        [&sums, &products],
    );
    products.write((2, 3));
    approvals.write(());
    sums.write((1, 1));
}
