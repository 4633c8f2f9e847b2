use serde_json::json;

use super::*;
use crate::providers::ProviderErrorKind;
use crate::testing::{setup_test_ledger, test_config, FailingKvStore, MockProvider, TestHarness};
use crate::traits::{Frequency, NewTransaction, TxKind};

fn record(items: serde_json::Value) -> serde_json::Value {
    MockProvider::tool_call_response("record_transactions", json!({ "items": items }))
}

async fn seed_expense(h: &TestHarness, category: &str, amount: i64) -> i64 {
    h.ledger
        .insert_transaction(
            "u1",
            &NewTransaction {
                kind: TxKind::Expense,
                amount,
                category: category.into(),
                note: None,
                occurred_on: local_today(7),
            },
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn clean_message_skips_normalization_and_records() {
    let h = TestHarness::with_config(
        vec![record(json!([{"type": "expense", "amount": 20000, "category": "bensin"}]))],
        test_config("nlu_model = \"nlu-model\""),
    )
    .await;

    let reply = h.send("u1", "bensin 20.000").await.unwrap();
    assert!(reply.contains("✅ Pengeluaran bensin Rp 20.000"), "{}", reply);

    let calls = h.provider.call_log.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, "main-model");
    assert_eq!(calls[0].user_text, "bensin 20.000");
    assert!(calls[0].require_action);
}

#[tokio::test]
async fn slang_goes_through_model_normalization() {
    let h = TestHarness::with_config(
        vec![
            MockProvider::text_response("makan 15000"),
            record(json!([{"type": "expense", "amount": 15000, "category": "makan"}])),
        ],
        test_config("nlu_model = \"nlu-model\""),
    )
    .await;

    let reply = h.send("u1", "makan 15rb").await.unwrap();
    assert!(reply.contains("Rp 15.000"));

    let calls = h.provider.call_log.lock().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].model, "nlu-model");
    assert!(calls[0].tool_names.is_empty());
    assert_eq!(calls[1].user_text, "makan 15000");
    assert!(!calls[1].require_action);
}

#[tokio::test]
async fn failed_model_normalization_falls_back_to_expander() {
    let h = TestHarness::with_config(vec![], test_config("nlu_model = \"nlu-model\"")).await;
    h.provider.push_error(anyhow::anyhow!("boom")).await;
    h.provider
        .push_response(MockProvider::text_response("Oke"))
        .await;

    h.send("u1", "parkir goceng").await.unwrap();
    let calls = h.provider.call_log.lock().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].user_text, "parkir 5000");
}

#[tokio::test]
async fn slang_without_nlu_model_uses_expander_only() {
    let h = TestHarness::new(vec![MockProvider::text_response("Oke")]).await;
    h.send("u1", "bensin 25rb").await.unwrap();
    let calls = h.provider.call_log.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].user_text, "bensin 25000");
}

#[tokio::test]
async fn duplicate_delivery_is_silent() {
    let h = TestHarness::new(vec![record(
        json!([{"type": "expense", "amount": 20000, "category": "bensin"}]),
    )])
    .await;

    assert!(h.send_with_id("u1", "m-1", "bensin 20.000").await.is_some());
    assert!(h.send_with_id("u1", "m-1", "bensin 20.000").await.is_none());
    assert_eq!(h.provider.call_count().await, 1);
    let today = local_today(7);
    let total = h
        .ledger
        .sum_transactions("u1", TxKind::Expense, today, today)
        .await
        .unwrap();
    assert_eq!(total, 20_000);
}

#[tokio::test]
async fn delete_needs_confirmation_then_runs() {
    let h = TestHarness::new(vec![MockProvider::tool_call_response(
        "delete_transaction",
        json!({}),
    )])
    .await;
    let id = seed_expense(&h, "bensin", 20_000).await;

    let prompt = h.send("u1", "hapus transaksi terakhir").await.unwrap();
    assert!(prompt.contains("Hapus Pengeluaran bensin Rp 20.000"), "{}", prompt);
    assert!(prompt.contains("Balas *ya*"));
    assert!(h.ledger.get_transaction("u1", id).await.unwrap().is_some());

    let done = h.send("u1", "ya").await.unwrap();
    assert!(done.contains("dihapus"), "{}", done);
    assert!(h.ledger.get_transaction("u1", id).await.unwrap().is_none());
    // The yes/no answer never reaches the model.
    assert_eq!(h.provider.call_count().await, 1);
}

#[tokio::test]
async fn negative_reply_cancels_delete() {
    let h = TestHarness::new(vec![MockProvider::tool_call_response(
        "delete_transaction",
        json!({}),
    )])
    .await;
    let id = seed_expense(&h, "bensin", 20_000).await;

    h.send("u1", "hapus transaksi terakhir").await.unwrap();
    let reply = h.send("u1", "batal").await.unwrap();
    assert!(reply.starts_with("Oke, nggak jadi."), "{}", reply);
    assert!(h.ledger.get_transaction("u1", id).await.unwrap().is_some());

    // Nothing pending any more: a later "ya" is an ordinary message.
    h.send("u1", "ya").await.unwrap();
    assert!(h.ledger.get_transaction("u1", id).await.unwrap().is_some());
}

#[tokio::test]
async fn unrelated_message_supersedes_pending_delete() {
    let h = TestHarness::new(vec![
        MockProvider::tool_call_response("delete_transaction", json!({})),
        record(json!([{"type": "expense", "amount": 5000, "category": "parkir"}])),
    ])
    .await;
    let id = seed_expense(&h, "bensin", 20_000).await;

    h.send("u1", "hapus transaksi terakhir").await.unwrap();
    let reply = h.send("u1", "parkir 5.000").await.unwrap();
    assert!(reply.contains("parkir"));
    h.send("u1", "ya").await.unwrap();
    assert!(h.ledger.get_transaction("u1", id).await.unwrap().is_some());
}

#[tokio::test]
async fn invalid_items_are_reported_not_coerced() {
    let h = TestHarness::new(vec![record(json!([
        {"type": "expense", "amount": 20000, "category": "bensin"},
        {"type": "expense", "amount": 0, "category": "makan"},
        {"type": "expense", "amount": "banyak", "category": "rokok"}
    ]))])
    .await;

    let reply = h.send("u1", "bensin 20.000 makan 0 rokok banyak").await.unwrap();
    assert!(reply.contains("Rp 20.000"));
    assert!(reply.contains("2 item gagal"), "{}", reply);
    let recent = h.ledger.recent_transactions("u1", 10).await.unwrap();
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn unknown_tool_is_dropped() {
    let h = TestHarness::new(vec![MockProvider::tool_call_response(
        "transfer_all_money",
        json!({"to": "attacker"}),
    )])
    .await;
    let reply = h.send("u1", "kirim semua duit").await.unwrap();
    assert_eq!(reply, NOT_UNDERSTOOD);
}

#[tokio::test]
async fn text_reply_is_passed_through_without_reasoning() {
    let h = TestHarness::new(vec![MockProvider::text_response(
        "<think>user greets</think> Halo! Mau catat apa hari ini?",
    )])
    .await;
    let reply = h.send("u1", "halo bang").await.unwrap();
    assert_eq!(reply, "Halo! Mau catat apa hari ini?");
}

#[tokio::test]
async fn provider_failure_becomes_an_apology() {
    let h = TestHarness::new(vec![]).await;
    h.provider
        .push_error(
            ProviderError {
                kind: ProviderErrorKind::ServerError,
                status: Some(503),
                message: "upstream down".into(),
                retry_after_secs: None,
            }
            .into(),
        )
        .await;
    let reply = h.send("u1", "bensin 20.000").await.unwrap();
    assert!(!reply.contains("upstream"));
    assert!(reply.contains("🙏"));

    h.provider.push_error(anyhow::anyhow!("weird")).await;
    let reply = h.send("u1", "bensin 20.000").await.unwrap();
    assert_eq!(reply, GENERIC_APOLOGY);
}

#[tokio::test]
async fn income_reply_carries_progress() {
    let h = TestHarness::new(vec![record(
        json!([{"type": "income", "amount": 110000, "category": "order"}]),
    )])
    .await;
    h.ledger
        .insert_obligation("u1", "setoran", 200_000, Frequency::Daily)
        .await
        .unwrap();

    let reply = h.send("u1", "dapet 110.000 dari order").await.unwrap();
    assert!(
        reply.contains("Progres: Rp 110.000 / Rp 220.000 (50%). Kurang Rp 110.000"),
        "{}",
        reply
    );
}

#[tokio::test]
async fn history_is_passed_on_next_call() {
    let h = TestHarness::new(vec![
        MockProvider::text_response("Halo!"),
        MockProvider::text_response("Siap"),
    ])
    .await;
    h.send("u1", "halo").await.unwrap();
    h.send("u1", "makasih").await.unwrap();
    let calls = h.provider.call_log.lock().await;
    assert_eq!(calls[0].history_len, 0);
    assert_eq!(calls[1].history_len, 2);
}

#[tokio::test]
async fn rate_limit_slows_down_chatty_users() {
    let h = TestHarness::with_config(
        vec![],
        test_config("[rate_limit]\nmax_messages = 2\nwindow_secs = 3600"),
    )
    .await;
    assert_ne!(h.send("u1", "halo").await.unwrap(), SLOW_DOWN);
    assert_ne!(h.send("u1", "halo").await.unwrap(), SLOW_DOWN);
    assert_eq!(h.send("u1", "halo").await.unwrap(), SLOW_DOWN);
    assert_eq!(h.provider.call_count().await, 2);
}

#[tokio::test]
async fn query_gets_read_only_tools() {
    let h = TestHarness::new(vec![MockProvider::tool_call_response(
        "get_recap",
        json!({"period": "today"}),
    )])
    .await;
    let reply = h.send("u1", "rekap hari ini").await.unwrap();
    assert!(reply.starts_with("📊 Rekap hari ini"));
    let calls = h.provider.call_log.lock().await;
    assert!(calls[0].require_action);
    assert!(calls[0].tool_names.iter().any(|n| n == "get_recap"));
    assert!(!calls[0].tool_names.iter().any(|n| n == "delete_debt"));
}

#[tokio::test]
async fn empty_message_gets_no_reply() {
    let h = TestHarness::new(vec![]).await;
    assert!(h.send("u1", "   ").await.is_none());
    assert_eq!(h.provider.call_count().await, 0);
}

#[tokio::test]
async fn bill_payment_is_recorded_not_turned_into_an_obligation() {
    for (text, category, amount) in [
        ("bayar listrik 200.000", "listrik", 200_000),
        ("bayar kos 500.000", "kos", 500_000),
    ] {
        let h = TestHarness::new(vec![record(
            json!([{"type": "expense", "amount": amount, "category": category}]),
        )])
        .await;
        let reply = h.send("u1", text).await.unwrap();
        assert!(reply.contains(&format!("Pengeluaran {}", category)), "{}", reply);

        let calls = h.provider.call_log.lock().await;
        assert!(calls[0].require_action);
        assert!(calls[0]
            .tool_names
            .iter()
            .any(|n| n == "record_transactions"));
        assert!(h.ledger.active_obligations("u1").await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn oil_change_does_not_touch_previous_entry() {
    let h = TestHarness::new(vec![record(
        json!([{"type": "expense", "amount": 50000, "category": "oli"}]),
    )])
    .await;
    let earlier = seed_expense(&h, "bensin", 20_000).await;

    let reply = h.send("u1", "ganti oli 50.000").await.unwrap();
    assert!(reply.contains("Pengeluaran oli Rp 50.000"), "{}", reply);
    let kept = h.ledger.get_transaction("u1", earlier).await.unwrap().unwrap();
    assert_eq!(kept.amount, 20_000);

    let calls = h.provider.call_log.lock().await;
    assert_eq!(calls[0].tool_names.len(), crate::actions::ActionKind::ALL.len());
}

#[tokio::test]
async fn broken_kv_store_still_answers_every_delivery() {
    let (ledger, _db_file) = setup_test_ledger().await;
    let provider = Arc::new(MockProvider::with_responses(vec![
        MockProvider::text_response("Halo!"),
        MockProvider::text_response("Halo lagi!"),
    ]));
    let pipeline = Pipeline::new(
        &test_config(""),
        provider.clone(),
        ledger,
        Arc::new(FailingKvStore),
    );
    let msg = InboundMessage {
        user_id: "u1".into(),
        chat_id: "c1".into(),
        message_id: "m1".into(),
        text: "halo".into(),
    };

    assert_eq!(pipeline.handle_message(&msg).await.as_deref(), Some("Halo!"));
    // Without a working store a redelivery cannot be recognised; it is processed.
    assert_eq!(
        pipeline.handle_message(&msg).await.as_deref(),
        Some("Halo lagi!")
    );
    assert_eq!(provider.call_count().await, 2);
}

#[test]
fn tool_choice_is_forced_only_when_the_subset_fits() {
    assert!(must_act(InputClass::Clean, &select_tools("bayar listrik 200.000")));
    assert!(must_act(InputClass::Query, &select_tools("rekap hari ini")));
    assert!(!must_act(InputClass::Clean, &select_tools("beli list pulsa 20.000")));
    assert!(!must_act(InputClass::Slang, &select_tools("bensin 20rb")));
}

#[test]
fn cancelled_note_reads_naturally() {
    assert_eq!(
        cancelled_note("Hapus utang ke Budi (sisa Rp 200.000)?"),
        "utang ke Budi (sisa Rp 200.000) tetap disimpan."
    );
}
