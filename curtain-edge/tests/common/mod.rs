pub mod mock_edge;
