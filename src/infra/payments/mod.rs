pub mod razorpay_gateway;
