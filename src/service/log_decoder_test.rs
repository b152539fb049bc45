#[cfg(test)]
mod tests {
    use crate::models::game_event::{GameEvent, RankDirection, Rarity};
    use crate::models::raw_log::{LogResult, RawLogEvent};
    use crate::service::hex_words::{derived_score, derived_score_gap, hex_bytes};
    use crate::service::log_decoder::*;
    use alloy_sol_types::SolValue;
    use chrono::{DateTime, Utc};
    use std::sync::Arc;

    const SIG: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

    fn now() -> DateTime<Utc> {
        "2024-01-01T00:00:00Z".parse().unwrap()
    }

    fn addr(byte: u8) -> String {
        format!("{:02x}", byte).repeat(20)
    }

    fn topic(address_hex: &str) -> String {
        format!("0x{:0>64}", address_hex)
    }

    fn uint_word(value: u64) -> String {
        format!("{:064x}", value)
    }

    fn addr_word(address_hex: &str) -> String {
        format!("{:0>64}", address_hex)
    }

    fn data(parts: &[String]) -> String {
        format!("0x{}", parts.concat())
    }

    fn raw_log(address: &str, topics: Vec<String>, data: String) -> RawLogEvent {
        RawLogEvent {
            subscription: Some("0xsub".to_string()),
            result: LogResult {
                address: address.to_string(),
                topics,
                data,
                block_number: None,
                transaction_hash: None,
                log_index: None,
            },
        }
    }

    /// Helper to create a decoder with deterministic rarity
    fn create_test_decoder() -> LogDecoder {
        LogDecoder::with_rarity_source(Arc::new(FixedRarity(Rarity::Epic)))
    }

    fn contract() -> String {
        format!("0x{}", addr(0xcc))
    }

    #[test]
    fn test_score_update_from_topic_player() {
        let log = raw_log(
            &contract(),
            vec![SIG.to_string(), topic(&addr(0xaa))],
            data(&[uint_word(500), uint_word(400)]),
        );

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "score_update");
        match decoded.event {
            GameEvent::ScoreUpdate(e) => {
                assert_eq!(e.player_address, format!("0x{}", addr(0xaa)));
                assert_eq!(e.score, 500);
                assert_eq!(e.previous_score, 400);
                assert_eq!(e.timestamp, now());
            }
            other => panic!("Expected ScoreUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_score_update_zero_value_fallbacks() {
        let decoder = create_test_decoder();
        let cases = [
            (0, 700, 1_000, 700),
            (300, 0, 300, 200),
            (50, 0, 50, 0),
        ];

        for (score_word, previous_word, score, previous) in cases {
            let log = raw_log(
                &contract(),
                vec![SIG.to_string(), topic(&addr(0xaa))],
                data(&[uint_word(score_word), uint_word(previous_word)]),
            );
            match decoder.decode(&log) {
                Some(GameEvent::ScoreUpdate(e)) => {
                    assert_eq!(e.score, score);
                    assert_eq!(e.previous_score, previous);
                }
                other => panic!("Expected ScoreUpdate, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_score_update_probes_data_for_player() {
        let log = raw_log(
            &contract(),
            vec![SIG.to_string()],
            data(&[addr_word(&addr(0xbb)), uint_word(0)]),
        );

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "score_update");
        match decoded.event {
            GameEvent::ScoreUpdate(e) => {
                assert_eq!(e.player_address, format!("0x{}", addr(0xbb)));
                // The probed word doubles as the score word and saturates
                assert_eq!(e.score, u64::MAX);
            }
            other => panic!("Expected ScoreUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_rank_change_when_score_pattern_rejects() {
        let log = raw_log(
            &contract(),
            vec![SIG.to_string(), "0x".to_string()],
            data(&[uint_word(0), uint_word(5), uint_word(0), "01".to_string()]),
        );

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "rank_change");
        match decoded.event {
            GameEvent::RankChange(e) => {
                assert_eq!(e.new_rank, 0);
                assert_eq!(e.previous_rank, 5);
                assert_eq!(e.direction, RankDirection::Down);
            }
            other => panic!("Expected RankChange, got {:?}", other),
        }
    }

    #[test]
    fn test_rank_change_needs_direction_byte() {
        // Three full words but no trailing direction byte
        let log = raw_log(
            &contract(),
            vec![SIG.to_string(), "0x".to_string()],
            data(&[uint_word(0), uint_word(5), uint_word(0)]),
        );

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_ne!(decoded.pattern, "rank_change");
    }

    #[test]
    fn test_match_result_takes_precedence_over_fallback() {
        let mut log = raw_log(
            &contract(),
            vec![SIG.to_string(), topic(&addr(0xaa)), topic(&addr(0xbb))],
            data(&[uint_word(0), uint_word(0), uint_word(7), "00".to_string()]),
        );
        log.result.transaction_hash = Some("0x1234567890abcdef1234567890".to_string());
        assert_eq!(hex_bytes(&log.result.data).unwrap().len(), 97);

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "match_result");
        match decoded.event {
            GameEvent::MatchResult(e) => {
                assert_eq!(e.match_id, "match-0x1234567890abcd");
                assert_eq!(e.player1_address, format!("0x{}", addr(0xaa)));
                assert_eq!(e.player2_address, format!("0x{}", addr(0xbb)));
                // Zero winner word falls back to the higher scorer
                assert_eq!(e.winner_address, e.player2_address);
                assert_eq!(e.player1_score, 0);
                assert_eq!(e.player2_score, 7);
                assert!(e.tournament_id.is_none());
            }
            other => panic!("Expected MatchResult, got {:?}", other),
        }
    }

    #[test]
    fn test_match_id_without_transaction_hash() {
        let log = raw_log(
            &contract(),
            vec![SIG.to_string(), topic(&addr(0xaa)), topic(&addr(0xbb))],
            data(&[uint_word(0), uint_word(0), uint_word(7), "00".to_string()]),
        );

        match create_test_decoder().decode_at(&log, now()).unwrap().event {
            GameEvent::MatchResult(e) => {
                assert_eq!(e.match_id, format!("match-{}", now().timestamp_millis()));
            }
            other => panic!("Expected MatchResult, got {:?}", other),
        }
    }

    #[test]
    fn test_achievement_pattern_decodes_abi_name() {
        let name = "First Blood".to_string().abi_encode();
        let log = raw_log(
            &contract(),
            vec![
                SIG.to_string(),
                topic(&addr(0xaa)),
                "0x00000000000000000000000000000000000000000000000000000000cafe0042".to_string(),
            ],
            format!("0x{}", hex::encode(name)),
        );

        let pattern = PATTERNS
            .iter()
            .find(|p| p.name == "achievement_unlocked")
            .unwrap();
        let prepared = PreparedLog::new(&log);
        let rarity = FixedRarity(Rarity::Legendary);
        let ctx = DecodeContext {
            now: now(),
            rarity: &rarity,
        };

        match (pattern.decode)(&prepared, &ctx) {
            Some(GameEvent::AchievementUnlocked(e)) => {
                assert_eq!(e.achievement_id, "achievement-00000000cafe0042");
                assert_eq!(e.achievement_name, "First Blood");
                assert_eq!(e.achievement_description, "Unlocked achievement: First Blood");
                assert_eq!(e.rarity, Rarity::Legendary);
                assert_eq!(e.player_address, format!("0x{}", addr(0xaa)));
            }
            other => panic!("Expected AchievementUnlocked, got {:?}", other),
        }
    }

    #[test]
    fn test_achievement_in_chain_with_undecodable_name() {
        // 40 bytes: too short for the score layout, long enough for an achievement
        let log = raw_log(
            &contract(),
            vec![
                SIG.to_string(),
                topic(&addr(0xaa)),
                "0x00000000000000000000000000000000000000000000000000000000cafe0042".to_string(),
            ],
            format!("0x{}", "11".repeat(40)),
        );

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "achievement_unlocked");
        match decoded.event {
            GameEvent::AchievementUnlocked(e) => {
                assert_eq!(e.achievement_name, "Achievement cafe0042");
                assert_eq!(e.rarity, Rarity::Epic);
            }
            other => panic!("Expected AchievementUnlocked, got {:?}", other),
        }
    }

    #[test]
    fn test_two_topic_fallback_scores() {
        let decoder = create_test_decoder();
        let player = addr(0x12);
        let player_bytes = hex_bytes(&player).unwrap();

        // No data: score derived from the address
        let log = raw_log(&contract(), vec![SIG.to_string(), topic(&player)], "0x".to_string());
        let decoded = decoder.decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "two_topic_fallback");
        match decoded.event {
            GameEvent::ScoreUpdate(e) => {
                assert_eq!(e.score, derived_score(&player_bytes));
                assert_eq!(
                    e.previous_score,
                    e.score - derived_score_gap(&player_bytes)
                );
            }
            other => panic!("Expected ScoreUpdate, got {:?}", other),
        }

        // One plausible data word
        let log = raw_log(
            &contract(),
            vec![SIG.to_string(), topic(&player)],
            data(&[uint_word(5_000)]),
        );
        match decoder.decode(&log) {
            Some(GameEvent::ScoreUpdate(e)) => assert_eq!(e.score, 5_000),
            other => panic!("Expected ScoreUpdate, got {:?}", other),
        }

        // Out-of-range data word
        let log = raw_log(
            &contract(),
            vec![SIG.to_string(), topic(&player)],
            data(&[uint_word(2_000_000)]),
        );
        match decoder.decode(&log) {
            Some(GameEvent::ScoreUpdate(e)) => assert_eq!(e.score, derived_score(&player_bytes)),
            other => panic!("Expected ScoreUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_data_scan_fallback_finds_player_and_score() {
        let log = raw_log(
            &contract(),
            vec![SIG.to_string()],
            data(&[uint_word(0), addr_word(&addr(0xbb)), uint_word(777)]),
        );

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "data_scan_fallback");
        match decoded.event {
            GameEvent::ScoreUpdate(e) => {
                assert_eq!(e.player_address, format!("0x{}", addr(0xbb)));
                assert_eq!(e.score, 777);
            }
            other => panic!("Expected ScoreUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_data_scan_skips_contract_address() {
        let log = raw_log(
            &contract().to_uppercase().replacen("0X", "0x", 1),
            vec![SIG.to_string()],
            data(&[addr_word(&addr(0xcc))]),
        );

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "contract_fallback");
    }

    #[test]
    fn test_contract_only_fallback() {
        let address = "0x00000000000000000000000000000000001234";
        let log = raw_log(address, vec![], String::new());

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "contract_fallback");
        match decoded.event {
            GameEvent::ScoreUpdate(e) => {
                assert_eq!(e.player_address, address);
                assert!((1_000..=10_999).contains(&e.score));
                assert!(e.previous_score < e.score);
            }
            other => panic!("Expected ScoreUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_contract_without_topics_decodes_to_none() {
        for address in [format!("0x{}", "0".repeat(40)), "0x".to_string(), String::new()] {
            let log = raw_log(&address, vec![], "0x".to_string());
            assert!(create_test_decoder().decode(&log).is_none(), "{:?}", address);
        }
    }

    #[test]
    fn test_contract_fallback_accepts_odd_length_hex() {
        let log = raw_log("0x1234567", vec![], String::new());

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "contract_fallback");
        match decoded.event {
            GameEvent::ScoreUpdate(e) => {
                assert_eq!(e.player_address, "0x1234567");
                assert_eq!(e.score, 0x0123_4567 % 10_000 + 1_000);
            }
            other => panic!("Expected ScoreUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_contract_fallback_accepts_non_hex_address() {
        let log = raw_log("not-an-address", vec![], "0x".to_string());

        let decoded = create_test_decoder().decode_at(&log, now()).unwrap();
        assert_eq!(decoded.pattern, "contract_fallback");
        match decoded.event {
            GameEvent::ScoreUpdate(e) => {
                assert_eq!(e.player_address, "not-an-address");
                assert_eq!(e.score, derived_score(b"not-an-address"));
                assert!(e.previous_score < e.score);
            }
            other => panic!("Expected ScoreUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_decoder_is_total_on_odd_inputs() {
        let decoder = LogDecoder::new();
        let contract = contract();
        let addresses = ["", "0x", "0xzz", "0x1234", contract.as_str()];
        let topic_sets: Vec<Vec<String>> = vec![
            vec![],
            vec!["".to_string()],
            vec![SIG.to_string(), "garbage".to_string()],
            vec![SIG.to_string(), topic(&addr(0xaa)), "0x1".to_string(), "0x".to_string()],
            vec![SIG.to_string(), topic(&addr(0xaa)), topic(&addr(0xbb))],
        ];
        let datas = [
            String::new(),
            "0x".to_string(),
            "0x123".to_string(),
            "0xnothex".to_string(),
            format!("0x{}", "ff".repeat(31)),
            format!("0x{}", "ff".repeat(97)),
            format!("0x{}", "00".repeat(300)),
        ];

        for address in addresses {
            for topics in &topic_sets {
                for d in &datas {
                    let log = raw_log(address, topics.clone(), d.clone());
                    if let Some(event) = decoder.decode(&log) {
                        assert!(GameEvent::is_type_tag(event.type_tag()));
                    }
                }
            }
        }
    }

    #[test]
    fn test_uniform_rarity_covers_tiers() {
        let source = UniformRarity;
        let picks: std::collections::HashSet<Rarity> = (0..400).map(|_| source.pick()).collect();
        assert!(picks.len() > 1);
        assert!(picks.iter().all(|r| Rarity::ALL.contains(r)));
    }

    #[test]
    fn test_pattern_order() {
        let names: Vec<&str> = PATTERNS.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "score_update",
                "rank_change",
                "match_result",
                "achievement_unlocked",
                "two_topic_fallback",
                "data_scan_fallback",
                "contract_fallback",
            ]
        );
    }
}
