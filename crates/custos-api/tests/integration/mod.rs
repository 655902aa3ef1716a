mod authentication;
mod bulk_cancel;
mod ownership;
mod public_and_roles;
