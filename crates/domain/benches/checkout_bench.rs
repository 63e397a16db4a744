use common::{Address, LineItem, Money};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{AddToCart, CartService, CheckoutService, ConfirmDraft, CreateDraft};
use store::InMemoryStore;

fn draft_request() -> CreateDraft {
    CreateDraft::new(
        "bench-user",
        vec![
            LineItem::new(1, 2, Money::from_minor(100_000)),
            LineItem::new(2, 1, Money::from_minor(950_000)),
        ],
    )
    .with_total(Money::from_minor(1_150_000))
    .with_address(Address::new("Dani", "Jl. Merdeka 1", "0812"))
    .with_payment_method("transfer")
}

fn bench_cart_merge(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CartService::new(InMemoryStore::new());

    c.bench_function("cart/add_item_merge", |b| {
        b.iter(|| {
            rt.block_on(async {
                let addition = service
                    .add_item(AddToCart::new("bench-user", 1))
                    .await
                    .unwrap();
                // Keep the line far from the quantity limit
                if addition.line.quantity > 1_000 {
                    service.clear_cart(&addition.line.user_id).await.unwrap();
                }
            });
        });
    });
}

fn bench_draft_roundtrip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CheckoutService::new(InMemoryStore::new());

    c.bench_function("checkout/create_and_confirm", |b| {
        b.iter(|| {
            rt.block_on(async {
                let draft = service.create_draft(draft_request()).await.unwrap();
                service
                    .confirm_draft(ConfirmDraft::new(draft.id).with_proof("IMG1"))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_cart_merge, bench_draft_roundtrip);
criterion_main!(benches);
