//! Tests for the browser front end

#[cfg(test)]
mod tests {
    use crate::dom::{escape_html, leaderboard_html, DomPresenter};
    use crate::storage::LocalStorageStore;
    use jigsaw_core::leaderboard::{LocalLeaderboard, RecordStore};
    use jigsaw_core::{
        layout, LeaderboardBackend, LeaderboardView, Modal, Permutation, Presenter, ScoreRecord,
    };
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;
    use web_sys::{Document, HtmlElement};

    wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    /// Attach a fresh element with `id` to the body
    fn mount(id: &str, class: &str) -> HtmlElement {
        let doc = document();
        if let Some(old) = doc.get_element_by_id(id) {
            old.remove();
        }
        let el = doc
            .create_element("div")
            .unwrap()
            .dyn_into::<HtmlElement>()
            .unwrap();
        el.set_id(id);
        el.set_class_name(class);
        doc.body().unwrap().append_child(&el).unwrap();
        el
    }

    fn record(nickname: &str, score: u32, timestamp: u64) -> ScoreRecord {
        ScoreRecord {
            nickname: nickname.to_string(),
            score,
            difficulty: "4x4".to_string(),
            time: "00:42".to_string(),
            date: "2026-10-19".to_string(),
            emotion: "🌟👏 Great Job!".to_string(),
            timestamp,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
        assert_eq!(escape_html("ace"), "ace");
    }

    #[test]
    fn test_leaderboard_html() {
        assert_eq!(
            leaderboard_html(&LeaderboardView::Empty),
            "<p>No scores registered yet.</p>"
        );
        let view = LeaderboardView::from_ranked(vec![record("<script>", 90, 1)]);
        let html = leaderboard_html(&view);
        assert!(html.contains("<td>1</td><td>&lt;script&gt;</td><td>90</td>"));
    }

    #[wasm_bindgen_test]
    fn test_build_and_render_board() {
        let board = mount("test-board", "");
        let mut presenter = DomPresenter::new(document(), "test-board").unwrap();

        presenter.build_board("img/test.png", 3);
        assert_eq!(presenter.tile_count(), 9);
        assert_eq!(board.child_element_count(), 9);

        let perm = Permutation::from_pieces(3, vec![8, 1, 2, 3, 4, 5, 6, 7, 0]).unwrap();
        presenter.render(&layout(&perm));

        let piece8 = board
            .query_selector("[data-piece-index=\"8\"]")
            .unwrap()
            .unwrap()
            .dyn_into::<HtmlElement>()
            .unwrap();
        assert_eq!(piece8.get_attribute("data-grid-index").as_deref(), Some("0"));
        assert_eq!(
            piece8.get_attribute("aria-label").as_deref(),
            Some("Tile 9, currently at row 1 column 1")
        );
        assert_eq!(
            piece8.style().get_property_value("background-position").unwrap(),
            "100% 100%"
        );
    }

    #[wasm_bindgen_test]
    fn test_modals_toggle_hidden_class() {
        let modal = mount("victory-modal", "hidden");
        let mount_board = mount("modal-board", "");
        let mut presenter = DomPresenter::new(document(), "modal-board").unwrap();

        presenter.show_modal(Modal::Victory);
        assert!(!modal.class_list().contains("hidden"));
        presenter.hide_modal(Modal::Victory);
        assert!(modal.class_list().contains("hidden"));
        mount_board.remove();
    }

    #[wasm_bindgen_test]
    fn test_timer_text() {
        let timer = mount("timer", "");
        mount("timer-board", "");
        let mut presenter = DomPresenter::new(document(), "timer-board").unwrap();
        presenter.set_timer_text("01:05");
        assert_eq!(timer.text_content().as_deref(), Some("01:05"));
    }

    #[wasm_bindgen_test]
    fn test_missing_board_is_an_error() {
        assert!(DomPresenter::new(document(), "no-such-board").is_err());
    }

    #[wasm_bindgen_test]
    fn test_local_storage_leaderboard() {
        let store = LocalStorageStore::new("jigsawLeaderboardTest");
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());

        let board = LocalLeaderboard::new(store);
        board.submit(record("low", 10, 1)).unwrap();
        let ranked = board.submit(record("high", 95, 2)).unwrap();
        assert_eq!(ranked[0].nickname, "high");
        assert_eq!(board.fetch().unwrap().len(), 2);
        board.store().clear().unwrap();
    }

    #[wasm_bindgen_test]
    fn test_malformed_storage_reads_empty() {
        let key = "jigsawLeaderboardBroken";
        let storage = web_sys::window().unwrap().local_storage().unwrap().unwrap();
        storage.set_item(key, "{oops").unwrap();
        let store = LocalStorageStore::new(key);
        assert!(store.load().unwrap().is_empty());
        store.clear().unwrap();
    }
}
