mod controller_flow_tests;
