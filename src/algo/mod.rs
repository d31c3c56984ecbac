pub mod clustering;
pub mod kmeans;
pub mod normalize;
pub mod oracle;
pub mod region;
pub mod report;
pub mod sentiment;
pub mod tfidf;
pub mod tokenizer;
