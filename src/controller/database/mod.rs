pub mod rdsinstance;
