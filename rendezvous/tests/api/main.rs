mod blocking;
mod conductor;
mod health_check;
mod helper;
mod sign_in;
