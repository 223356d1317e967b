pub mod servicelinkedrole;
