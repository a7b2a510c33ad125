//! Integration tests for the HTTP routes.

mod integration_tests {
    use actix_web::{http::header::CACHE_CONTROL, test, web, App};
    use alloy::{
        eips::BlockId,
        primitives::{Address, B256},
    };
    use async_trait::async_trait;
    use slotscope_server::{configure, ErrorBody, HealthBody, StorageBody, CACHE_CONTROL_VALUE};
    use slotscope_storage::{
        DataType, Error, FetchOptions, NoMetadata, StorageRpc, StorageService,
    };
    use std::{
        str::FromStr,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
    const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

    /// WETH is deployed and stores its own address in slot 3; USDC is deployed with empty
    /// storage. Every other address has no code.
    struct MockChain {
        chunk_error: Option<Error>,
        chunk_calls: AtomicUsize,
    }

    impl MockChain {
        fn new(chunk_error: Option<Error>) -> Arc<Self> {
            Arc::new(Self { chunk_error, chunk_calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl StorageRpc for MockChain {
        async fn is_contract(&self, address: Address) -> Result<bool, Error> {
            Ok(address == Address::from_str(WETH).expect("valid address") ||
                address == Address::from_str(USDC).expect("valid address"))
        }

        async fn get_storage_chunk(
            &self,
            address: Address,
            slots: &[u64],
            _block: BlockId,
        ) -> Result<Vec<B256>, Error> {
            self.chunk_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.chunk_error {
                return Err(err.clone());
            }

            let weth = Address::from_str(WETH).expect("valid address");
            Ok(slots
                .iter()
                .map(|slot| if address == weth && *slot == 3 { weth.into_word() } else { B256::ZERO })
                .collect())
        }

        async fn get_block_number(&self) -> Result<u64, Error> {
            Ok(19_000_000)
        }
    }

    fn service(chain: Arc<MockChain>) -> web::Data<StorageService> {
        web::Data::new(
            StorageService::new(Arc::new(NoMetadata), Duration::from_secs(300))
                .with_rpc(1, chain)
                .with_fetch_options(FetchOptions {
                    max_attempts: 1,
                    ..Default::default()
                }),
        )
    }

    #[actix_web::test]
    async fn test_get_storage() {
        let app = test::init_service(
            App::new().app_data(service(MockChain::new(None))).configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/storage/{WETH}?chainId=1&start=0&end=5"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some(CACHE_CONTROL_VALUE)
        );

        let body: StorageBody = test::read_body_json(resp).await;
        assert!(body.success);
        assert!(!body.cached);
        assert_eq!(body.data.total_slots_fetched, 6);
        assert_eq!(body.data.slots[3].data_type, DataType::Address);
        assert_eq!(body.data.slots[3].decoded_value, "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        assert_eq!(body.data.block_number, Some(19_000_000));
    }

    #[actix_web::test]
    async fn test_default_query_parameters() {
        let app = test::init_service(
            App::new().app_data(service(MockChain::new(None))).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri(&format!("/storage/{USDC}")).to_request();
        let body: StorageBody = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.data.chain_id, 1);
        assert_eq!(body.data.slot_range.start, 0);
        assert_eq!(body.data.slot_range.end, 255);
        assert_eq!(body.data.total_slots_fetched, 256);
        assert!(body.data.slots.iter().all(|slot| slot.is_empty));
    }

    #[actix_web::test]
    async fn test_second_request_is_cached() {
        let chain = MockChain::new(None);
        let app =
            test::init_service(App::new().app_data(service(chain.clone())).configure(configure))
                .await;

        let uri = format!("/storage/{USDC}?start=0&end=5");
        let first: StorageBody =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request())
                .await;
        let second: StorageBody =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request())
                .await;

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.data, second.data);
        assert_eq!(chain.chunk_calls.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn test_error_statuses() {
        let app = test::init_service(
            App::new().app_data(service(MockChain::new(None))).configure(configure),
        )
        .await;

        for (uri, status, message) in [
            ("/storage/0x1234?start=0&end=5".to_string(), 400, "Invalid contract address format"),
            (format!("/storage/{WETH}?start=10&end=5"), 400, "Invalid slot range"),
            (format!("/storage/{WETH}?start=abc"), 400, "Invalid slot range"),
            (format!("/storage/{WETH}?start=0&end=1001"), 400, "Slot range too large"),
            (format!("/storage/{WETH}?chainId=0"), 400, "Invalid chainId"),
            (format!("/storage/{WETH}?chainId=137"), 400, "Unsupported chainId"),
            (format!("/storage/{WETH}?blockTag=tomorrow"), 400, "Invalid blockTag"),
            (format!("/storage/{}?start=0&end=5", Address::ZERO), 404, "No contract found"),
        ] {
            let resp =
                test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
            assert_eq!(resp.status(), status, "{uri}");
            assert!(resp.headers().get(CACHE_CONTROL).is_none());

            let body: ErrorBody = test::read_body_json(resp).await;
            assert!(!body.success);
            assert!(body.error.starts_with(message), "{uri}: {}", body.error);
            assert!(body.latency.is_some());
        }
    }

    #[actix_web::test]
    async fn test_range_width_boundary() {
        let app = test::init_service(
            App::new().app_data(service(MockChain::new(None))).configure(configure),
        )
        .await;

        let req =
            test::TestRequest::get().uri(&format!("/storage/{USDC}?start=0&end=1000")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req =
            test::TestRequest::get().uri(&format!("/storage/{USDC}?start=0&end=1001")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_upstream_error_statuses() {
        for (err, status) in [
            (Error::UpstreamRateLimited("429".to_string()), 429),
            (Error::UpstreamTimeout("eth_getStorageAt".to_string()), 504),
            (Error::UpstreamUnavailable("connection refused".to_string()), 500),
        ] {
            let app = test::init_service(
                App::new().app_data(service(MockChain::new(Some(err)))).configure(configure),
            )
            .await;

            let req =
                test::TestRequest::get().uri(&format!("/storage/{WETH}?start=0&end=5")).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), status);

            let body: ErrorBody = test::read_body_json(resp).await;
            assert!(!body.success);
        }
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(
            App::new().app_data(service(MockChain::new(None))).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthBody = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
