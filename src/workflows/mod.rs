pub mod disputes;
