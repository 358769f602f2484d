pub mod mock_bot_api;
